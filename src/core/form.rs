//! Typed form input.
//!
//! The browser hands over `(name, value)` pairs; [`RecordInput::from_pairs`]
//! maps the names the record form uses onto fields, and
//! [`RecordInput::validate`] turns them into a [`RecordDraft`] ready to be
//! merged into a stored record.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::record::{MetricKey, MetricSelection, Metrics, Record, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInput {
    pub shop_name: String,
    pub date: String,
    pub notes: String,
    /// Per metric: `(option, custom)` as submitted.
    pub metrics: Vec<(MetricKey, String, String)>,
    pub share_community: bool,
    pub save_personal: bool,
}

impl RecordInput {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self {
            metrics: MetricKey::all()
                .iter()
                .map(|&k| (k, String::new(), String::new()))
                .collect(),
            ..Self::default()
        };

        for (name, value) in pairs {
            let name = name.as_ref();
            match name {
                "shopName" => input.shop_name = value.into(),
                "date" => input.date = value.into(),
                "notes" => input.notes = value.into(),
                // Checkboxes only submit when ticked.
                "shareCommunity" => input.share_community = true,
                "savePersonal" => input.save_personal = true,
                _ => input.set_metric_field(name, value.into()),
            }
        }
        input
    }

    fn set_metric_field(&mut self, name: &str, value: String) {
        for (key, option, custom) in self.metrics.iter_mut() {
            if name == key.option_field() {
                *option = value;
                return;
            } else if name == key.custom_field() {
                *custom = value;
                return;
            }
        }
    }

    pub fn validate(self, today: NaiveDate) -> Result<RecordDraft, ValidationError> {
        let shop_name = self.shop_name.trim().to_string();
        if shop_name.is_empty() {
            return Err(ValidationError::MissingShopName);
        }

        let date = match self.date.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?,
        };

        let mut metrics = Metrics::default();
        for (key, option, custom) in self.metrics {
            // Unknown or missing options fall back to the metric default; custom
            // text is kept even when empty.
            let option = if key.options().contains(&option.as_str()) {
                option
            } else {
                key.default_option().to_string()
            };
            metrics.set(key, MetricSelection::new(option, custom.trim()));
        }

        Ok(RecordDraft {
            shop_name,
            date,
            notes: self.notes.trim().to_string(),
            metrics,
            share_community: self.share_community,
            save_personal: self.save_personal,
        })
    }
}

/// Validated form contents.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub shop_name: String,
    pub date: NaiveDate,
    pub notes: String,
    pub metrics: Metrics,
    pub share_community: bool,
    pub save_personal: bool,
}

impl RecordDraft {
    /// Merge into `base`, keeping its id and creation time. `image` replaces the
    /// stored photo only when non-empty.
    pub fn apply_to(
        self,
        mut base: Record,
        image: Option<String>,
        user: Option<&User>,
        now: DateTime<Utc>,
    ) -> Record {
        base.shop_name = self.shop_name;
        base.date = Some(self.date);
        base.notes = self.notes;
        base.metrics = self.metrics;
        base.share_community = self.share_community;
        base.save_personal = self.save_personal;
        if let Some(image) = image.filter(|i| !i.is_empty()) {
            base.image_data_url = image;
        }
        if let Some(user) = user {
            base.user_id = Some(user.id.clone());
        }
        base.updated_at = now;
        base
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInput {
    pub nickname: String,
}

impl AuthInput {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self::default();
        for (name, value) in pairs {
            if name.as_ref() == "nickname" {
                input.nickname = value.into();
            }
        }
        input
    }

    pub fn validate(&self) -> Result<User, ValidationError> {
        User::from_nickname(&self.nickname).ok_or(ValidationError::MissingNickname)
    }
}
