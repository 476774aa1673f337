//! Live event details bound into `dataField`-tagged elements.

use serde::{Deserialize, Serialize};

/// Event-detail field an element's text can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataField {
    /// Event title.
    Title,
    /// Invitation message.
    Message,
    /// Event date.
    Date,
    /// Venue.
    Location,
    /// Host name(s).
    HostName,
}

/// Free-text event details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// Event title.
    #[serde(default)]
    pub title: String,
    /// Invitation message.
    #[serde(default)]
    pub message: String,
    /// Event date.
    #[serde(default)]
    pub date: String,
    /// Venue.
    #[serde(default)]
    pub location: String,
    /// Host name(s).
    #[serde(default)]
    pub host_name: String,
}

impl EventDetails {
    /// Value of a bound field.
    #[must_use]
    pub fn get(&self, field: DataField) -> &str {
        match field {
            DataField::Title => &self.title,
            DataField::Message => &self.message,
            DataField::Date => &self.date,
            DataField::Location => &self.location,
            DataField::HostName => &self.host_name,
        }
    }

    /// Set a bound field.
    pub fn set(&mut self, field: DataField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DataField::Title => self.title = value,
            DataField::Message => self.message = value,
            DataField::Date => self.date = value,
            DataField::Location => self.location = value,
            DataField::HostName => self.host_name = value,
        }
    }

    /// Details the editor starts with before the user edits anything.
    #[must_use]
    pub fn starter() -> Self {
        Self {
            title: "New Design".to_string(),
            message: "You're Invited!".to_string(),
            date: "2025-12-25T18:00".to_string(),
            location: "Grand Ballroom, The Plaza Hotel".to_string(),
            host_name: "Sarah & Michael".to_string(),
        }
    }
}
