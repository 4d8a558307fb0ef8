//! Stored document shape and its decoding into a `StatusRecord`.
//!
//! Documents keep states as plain strings, the way they sit in the store.
//! Decoding is the one place a string becomes a [`UserState`]; an unknown value
//! is reported with the field it came from.
//!
//! Legacy documents wrote an empty `futureStatus: {}` for "nothing scheduled"
//! and `until: ""` for open-ended periods. Both decode to `None`.

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::UserId;
use super::record::{MonthlyHours, StatusPeriod, StatusRecord};
use super::state::UserState;
use super::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDocument {
    pub state: String,
    pub from: Timestamp,
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub until: Option<Timestamp>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub user_id: String,
    pub current_status: PeriodDocument,
    #[serde(
        default,
        deserialize_with = "empty_object_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub future_status: Option<PeriodDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_hours: Option<MonthlyHours>,
}

/// A stored state string outside the closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}.state holds unrecognized value '{value}'")]
pub struct InvalidStoredState {
    pub field: &'static str,
    pub value: String,
}

impl PeriodDocument {
    fn decode(self, field: &'static str) -> Result<StatusPeriod, InvalidStoredState> {
        let state = self
            .state
            .parse::<UserState>()
            .map_err(|e| InvalidStoredState { field, value: e.0 })?;
        Ok(StatusPeriod {
            state,
            from: self.from,
            until: self.until,
            message: self.message,
            updated_at: self.updated_at,
        })
    }
}

impl From<&StatusPeriod> for PeriodDocument {
    fn from(period: &StatusPeriod) -> Self {
        Self {
            state: period.state.as_str().to_string(),
            from: period.from,
            until: period.until,
            message: period.message.clone(),
            updated_at: period.updated_at,
        }
    }
}

impl StatusDocument {
    pub fn decode(self) -> Result<StatusRecord, InvalidStoredState> {
        Ok(StatusRecord {
            user_id: UserId::new(self.user_id),
            current_status: self.current_status.decode("currentStatus")?,
            future_status: self
                .future_status
                .map(|future| future.decode("futureStatus"))
                .transpose()?,
            monthly_hours: self.monthly_hours,
        })
    }
}

impl From<&StatusRecord> for StatusDocument {
    fn from(record: &StatusRecord) -> Self {
        Self {
            user_id: record.user_id.as_str().to_string(),
            current_status: PeriodDocument::from(&record.current_status),
            future_status: record.future_status.as_ref().map(PeriodDocument::from),
            monthly_hours: record.monthly_hours.clone(),
        }
    }
}

fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Millis(Timestamp),
        Text(String),
    }

    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Millis(ms)) => Ok(Some(ms)),
        Some(Loose::Text(text)) if text.is_empty() => Ok(None),
        Some(Loose::Text(text)) => text
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid timestamp '{text}'"))),
    }
}

fn empty_object_as_none<'de, D>(deserializer: D) -> Result<Option<PeriodDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_empty_fields_decode_to_none() {
        let doc: StatusDocument = serde_json::from_value(json!({
            "userId": "u1",
            "currentStatus": { "state": "IDLE", "from": 10, "until": "", "message": "", "updatedAt": 10 },
            "futureStatus": {},
            "monthlyHours": { "committed": 40, "updatedAt": 3 }
        }))
        .unwrap();

        let record = doc.decode().unwrap();
        assert_eq!(record.current_status.until, None);
        assert_eq!(record.future_status, None);
        assert_eq!(record.monthly_hours.unwrap().committed, 40.0);
    }

    #[test]
    fn unknown_state_names_the_field() {
        let doc: StatusDocument = serde_json::from_value(json!({
            "userId": "u1",
            "currentStatus": { "state": "ACTIVE", "from": 10 },
            "futureStatus": { "state": "VACATION", "from": 20 }
        }))
        .unwrap();

        let err = doc.decode().unwrap_err();
        assert_eq!(err.field, "futureStatus");
        assert_eq!(err.value, "VACATION");
    }

    #[test]
    fn record_survives_document_form() {
        let record = StatusRecord::new(UserId::new("u1"), StatusPeriod::ooo(1, 9, "away"))
            .with_future(StatusPeriod::new(UserState::Active, 9));

        let doc = StatusDocument::from(&record);
        assert_eq!(doc.current_status.state, "OOO");
        assert_eq!(doc.decode().unwrap(), record);
    }
}
