//! Hash-fragment routes.

use url::form_urlencoded;

use crate::record::RecordKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Community,
    My,
    New,
    Edit {
        kind: RecordKind,
        id: String,
    },
    Detail {
        kind: RecordKind,
        id: String,
    },
    /// `#/list`, the single-collection variant's list view. Shows the community list.
    List,
}

impl Route {
    /// Parse `location.hash`. Empty and unknown fragments go to the community list.
    pub fn parse(hash: &str) -> Self {
        let hash = if hash.is_empty() { "#/community" } else { hash };
        let (path, query) = hash.split_once('?').unwrap_or((hash, ""));

        let mut kind = None;
        let mut id = String::new();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            match k.as_ref() {
                "type" => kind = Some(v.into_owned()),
                "id" => id = v.into_owned(),
                _ => {}
            }
        }
        let kind = RecordKind::from_param(kind.as_deref());

        match path {
            "#/my" => Route::My,
            "#/new" => Route::New,
            "#/edit" => Route::Edit { kind, id },
            "#/detail" => Route::Detail { kind, id },
            "#/list" => Route::List,
            _ => Route::Community,
        }
    }

    pub fn to_hash(&self) -> String {
        match self {
            Route::Community => "#/community".to_string(),
            Route::My => "#/my".to_string(),
            Route::New => "#/new".to_string(),
            Route::List => "#/list".to_string(),
            Route::Edit { kind, id } => format!("#/edit?{}", record_query(*kind, id)),
            Route::Detail { kind, id } => format!("#/detail?{}", record_query(*kind, id)),
        }
    }

    /// The list a collection's records navigate back to.
    pub fn home_of(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Community => Route::Community,
            RecordKind::Personal => Route::My,
        }
    }
}

fn record_query(kind: RecordKind, id: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("type", kind.as_str())
        .append_pair("id", id)
        .finish()
}
