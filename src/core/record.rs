//! Logged visits and their serving-size metrics.
//!
//! Field names serialize in camelCase so documents written by earlier versions
//! of the client keep loading. Deserialization is lenient: anything missing or
//! malformed falls back to a default instead of rejecting the whole record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Option value that switches a metric to its free-text `custom` value.
pub const CUSTOM_OPTION: &str = "カスタム";

pub const NOODLE_OPTIONS: [&str; 5] = ["半分", "少なめ", "小", "大", CUSTOM_OPTION];

pub const TOPPING_OPTIONS: [&str; 7] = [
    "なし",
    "少なめ",
    "普通",
    "マシ",
    "マシマシ",
    "限界",
    CUSTOM_OPTION,
];

const DEFAULT_OPTION_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKey {
    Noodles,
    Pork,
    Garlic,
    Veg,
    Fat,
    Karame,
}

impl MetricKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::Noodles => "noodles",
            MetricKey::Pork => "pork",
            MetricKey::Garlic => "garlic",
            MetricKey::Veg => "veg",
            MetricKey::Fat => "fat",
            MetricKey::Karame => "karame",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricKey::Noodles => "麺量",
            MetricKey::Pork => "ブタ",
            MetricKey::Garlic => "ニンニク",
            MetricKey::Veg => "ヤサイ",
            MetricKey::Fat => "アブラ",
            MetricKey::Karame => "カラメ",
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            MetricKey::Noodles => &NOODLE_OPTIONS,
            _ => &TOPPING_OPTIONS,
        }
    }

    pub fn default_option(self) -> &'static str {
        self.options()[DEFAULT_OPTION_INDEX]
    }

    pub fn default_selection(self) -> MetricSelection {
        MetricSelection::new(self.default_option(), "")
    }

    /// Form field carrying the selected option, e.g. `garlicOption`.
    pub fn option_field(self) -> String {
        format!("{}Option", self.as_str())
    }

    /// Form field carrying the free-text override, e.g. `garlicCustom`.
    pub fn custom_field(self) -> String {
        format!("{}Custom", self.as_str())
    }

    pub fn all() -> &'static [MetricKey] {
        &[
            MetricKey::Noodles,
            MetricKey::Pork,
            MetricKey::Garlic,
            MetricKey::Veg,
            MetricKey::Fat,
            MetricKey::Karame,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSelection {
    pub option: String,
    #[serde(default)]
    pub custom: String,
}

impl MetricSelection {
    pub fn new(option: impl Into<String>, custom: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            custom: custom.into(),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.option == CUSTOM_OPTION
    }

    /// The text to show for this selection: the custom text when the custom
    /// sentinel is chosen and something was typed, the option otherwise.
    pub fn display(&self) -> &str {
        if self.is_custom() && !self.custom.trim().is_empty() {
            self.custom.trim()
        } else {
            &self.option
        }
    }

    fn from_json(value: Option<&serde_json::Value>) -> Option<Self> {
        let obj = value?.as_object()?;
        let option = obj.get("option")?.as_str()?;
        if option.is_empty() {
            return None;
        }
        let custom = obj.get("custom").and_then(|c| c.as_str()).unwrap_or("");
        Some(Self::new(option, custom))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub noodles: MetricSelection,
    pub pork: MetricSelection,
    pub garlic: MetricSelection,
    pub veg: MetricSelection,
    pub fat: MetricSelection,
    pub karame: MetricSelection,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            noodles: MetricKey::Noodles.default_selection(),
            pork: MetricKey::Pork.default_selection(),
            garlic: MetricKey::Garlic.default_selection(),
            veg: MetricKey::Veg.default_selection(),
            fat: MetricKey::Fat.default_selection(),
            karame: MetricKey::Karame.default_selection(),
        }
    }
}

impl Metrics {
    pub fn get(&self, key: MetricKey) -> &MetricSelection {
        match key {
            MetricKey::Noodles => &self.noodles,
            MetricKey::Pork => &self.pork,
            MetricKey::Garlic => &self.garlic,
            MetricKey::Veg => &self.veg,
            MetricKey::Fat => &self.fat,
            MetricKey::Karame => &self.karame,
        }
    }

    pub fn set(&mut self, key: MetricKey, selection: MetricSelection) {
        let slot = match key {
            MetricKey::Noodles => &mut self.noodles,
            MetricKey::Pork => &mut self.pork,
            MetricKey::Garlic => &mut self.garlic,
            MetricKey::Veg => &mut self.veg,
            MetricKey::Fat => &mut self.fat,
            MetricKey::Karame => &mut self.karame,
        };
        *slot = selection;
    }

    /// Build metrics from whatever JSON was persisted. Metrics that are missing
    /// or not in `{option, custom}` shape (e.g. the old numeric levels) get the
    /// per-metric default.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut metrics = Self::default();
        for &key in MetricKey::all() {
            if let Some(selection) = MetricSelection::from_json(value.get(key.as_str())) {
                metrics.set(key, selection);
            }
        }
        metrics
    }
}

impl<'de> Deserialize<'de> for Metrics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordKind {
    #[default]
    Community,
    Personal,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Community => "community",
            RecordKind::Personal => "personal",
        }
    }

    /// Anything other than `personal` addresses the community collection.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("personal") => RecordKind::Personal,
            _ => RecordKind::Community,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    /// Nickname-only sign-in: the id is the lower-cased nickname.
    pub fn from_nickname(nickname: &str) -> Option<Self> {
        let name = nickname.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: name.to_lowercase(),
            name: name.to_string(),
        })
    }
}

fn default_true() -> bool {
    true
}

/// Reads any JSON value and falls back to `T::default()` when it is `null` or
/// the wrong shape.
pub(crate) fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(d)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(serde_json::Value::deserialize(d)?.as_bool().unwrap_or(true))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient")]
    pub shop_name: String,
    #[serde(default, with = "date_field")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient")]
    pub image_data_url: String,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default = "default_true", deserialize_with = "lenient_true")]
    pub share_community: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub save_personal: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
}

impl Record {
    /// A blank record for the "new" form.
    pub fn new(user: Option<&User>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            shop_name: String::new(),
            date: Some(now.date_naive()),
            notes: String::new(),
            image_data_url: String::new(),
            metrics: Metrics::default(),
            share_community: true,
            save_personal: user.is_some(),
            user_id: user.map(|u| u.id.clone()),
        }
    }

    pub fn date_label(&self) -> String {
        match self.date {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "----".to_string(),
        }
    }

    /// Lower-cased text the list search matches against.
    pub fn search_text(&self) -> String {
        let mut out = self.shop_name.clone();
        for &key in MetricKey::all() {
            let m = self.metrics.get(key);
            out.push(' ');
            out.push_str(&m.option);
            out.push(' ');
            out.push_str(&m.custom);
        }
        out.push(' ');
        out.push_str(&self.notes);
        out.to_lowercase()
    }
}

/// `YYYY-MM-DD`, with `""` standing for "no date".
mod date_field {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.collect_str(&d.format("%Y-%m-%d")),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = serde_json::Value::deserialize(d)?;
        Ok(raw
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metric_inventory_is_stable() {
        let all = MetricKey::all();
        assert_eq!(all.len(), 6);
        for &k in all {
            assert!(k.options().contains(&CUSTOM_OPTION));
            assert!(!k.label().is_empty());
        }
        assert_eq!(MetricKey::Noodles.default_option(), "小");
        assert_eq!(MetricKey::Garlic.default_option(), "普通");
        assert_eq!(MetricKey::Fat.option_field(), "fatOption");
        assert_eq!(MetricKey::Fat.custom_field(), "fatCustom");
    }

    #[test]
    fn custom_text_only_shows_for_sentinel() {
        let custom = MetricSelection::new(CUSTOM_OPTION, " 全マシ ");
        assert_eq!(custom.display(), "全マシ");

        let empty_custom = MetricSelection::new(CUSTOM_OPTION, "");
        assert_eq!(empty_custom.display(), CUSTOM_OPTION);

        let plain = MetricSelection::new("マシ", "ignored");
        assert_eq!(plain.display(), "マシ");
    }

    #[test]
    fn malformed_metrics_fall_back_per_key() {
        let value = json!({
            "noodles": 3,
            "pork": { "option": "マシ", "custom": "" },
            "garlic": { "option": "" },
            "veg": null
        });
        let m = Metrics::from_json(&value);
        assert_eq!(m.noodles, MetricKey::Noodles.default_selection());
        assert_eq!(m.pork.option, "マシ");
        assert_eq!(m.garlic, MetricKey::Garlic.default_selection());
        assert_eq!(m.veg, MetricKey::Veg.default_selection());
        assert_eq!(m.karame, MetricKey::Karame.default_selection());
    }

    #[test]
    fn sparse_record_deserializes_with_defaults() {
        let value = json!({
            "id": "abc",
            "createdAt": "2024-05-01T09:30:00.000Z",
            "shopName": "三田本店",
            "date": ""
        });
        let r: Record = serde_json::from_value(value).unwrap();
        assert_eq!(r.id, "abc");
        assert_eq!(r.date, None);
        assert_eq!(r.date_label(), "----");
        assert!(r.share_community);
        assert!(!r.save_personal);
        assert_eq!(r.user_id, None);
        assert_eq!(r.metrics, Metrics::default());
    }

    #[test]
    fn wrong_typed_fields_fall_back_without_dropping_the_record() {
        let value = json!({
            "id": "keep-me",
            "createdAt": "",
            "updatedAt": null,
            "shopName": "三田本店",
            "date": 20240501,
            "notes": null,
            "imageDataUrl": false,
            "metrics": null,
            "shareCommunity": "yes",
            "savePersonal": "no",
            "userId": 5
        });
        let r: Record = serde_json::from_value(value).unwrap();
        assert_eq!(r.id, "keep-me");
        assert_eq!(r.shop_name, "三田本店");
        assert_eq!(r.created_at, DateTime::<Utc>::default());
        assert_eq!(r.date, None);
        assert_eq!(r.notes, "");
        assert_eq!(r.image_data_url, "");
        assert_eq!(r.metrics, Metrics::default());
        assert!(r.share_community);
        assert!(!r.save_personal);
        assert_eq!(r.user_id, None);
    }

    #[test]
    fn record_json_uses_camel_case_and_plain_dates() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let user = User::from_nickname("Jiro").unwrap();
        let r = Record::new(Some(&user), now);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["date"], "2024-05-01");
        assert_eq!(v["userId"], "jiro");
        assert_eq!(v["savePersonal"], true);
        assert_eq!(v["metrics"]["noodles"]["option"], "小");
        assert!(v.get("shopName").is_some());
    }

    #[test]
    fn nickname_sign_in() {
        assert_eq!(User::from_nickname("   "), None);
        let u = User::from_nickname(" Mashi ").unwrap();
        assert_eq!(u.id, "mashi");
        assert_eq!(u.name, "Mashi");
    }

    #[test]
    fn record_kind_param_defaults_to_community() {
        assert_eq!(RecordKind::from_param(None), RecordKind::Community);
        assert_eq!(RecordKind::from_param(Some("bogus")), RecordKind::Community);
        assert_eq!(
            RecordKind::from_param(Some("personal")),
            RecordKind::Personal
        );
    }
}
