use serde::{Deserialize, Serialize};

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod entity {
    use super::*;

    /// JSON object sent on create/update.
    ///
    /// Field names and shapes are page-specific; the engine fills it from the
    /// current form values after transcoding.
    pub type Payload = serde_json::Map<String, serde_json::Value>;

    /// A record as returned by the backend.
    ///
    /// Everything except `id` is flattened into `fields`, so the wire shape is
    /// just the page-specific object with an `id` key.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Entity {
        pub id: String,
        #[serde(flatten)]
        pub fields: Payload,
    }

    impl Entity {
        pub fn new(id: impl Into<String>, fields: Payload) -> Self {
            Self {
                id: id.into(),
                fields,
            }
        }

        pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
            self.fields.get(name)
        }
    }
}

pub mod reference {
    use super::*;

    /// Reference lists shared by several forms.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RefKey {
        Brands,
        Channels,
        Cities,
    }

    impl RefKey {
        pub const ALL: [RefKey; 3] = [Self::Brands, Self::Channels, Self::Cities];

        /// Returns the path segment used by the backend.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Brands => "brands",
                Self::Channels => "channels",
                Self::Cities => "cities",
            }
        }
    }

    impl std::fmt::Display for RefKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RefItem {
        pub id: String,
        pub name: String,
    }

    /// Response body for `GET /reference/{key}`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefListResponse {
        pub items: Vec<RefItem>,
    }
}

#[cfg(test)]
mod tests {
    use super::entity::Entity;
    use super::reference::RefKey;

    #[test]
    fn entity_flattens_page_fields() {
        let raw = r#"{"id":"p-1","code":"SUMMER","discountValue":0.5}"#;
        let entity: Entity = serde_json::from_str(raw).unwrap();
        assert_eq!(entity.id, "p-1");
        assert_eq!(entity.field("code"), Some(&serde_json::json!("SUMMER")));
        assert_eq!(entity.field("discountValue"), Some(&serde_json::json!(0.5)));
        assert!(entity.field("id").is_none());
    }

    #[test]
    fn ref_key_uses_snake_case() {
        assert_eq!(serde_json::to_string(&RefKey::Brands).unwrap(), "\"brands\"");
        assert_eq!(RefKey::Cities.to_string(), "cities");
    }
}
