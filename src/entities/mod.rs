use serde::{Deserialize, Deserializer};

/// Apply `$value` to `$column` of an `update_many` query when the patch
/// carries it.
macro_rules! set_if_present {
    ($query:ident, $column:expr, $value:expr) => {
        if let Some(value) = $value {
            $query = $query.col_expr($column, sea_orm::entity::prelude::Expr::value(value));
        }
    };
}

pub mod activity;
pub mod content;
pub mod inbox;
pub mod media;
pub mod seo;
pub mod users;

/// Tell an explicit `null` apart from a missing field in a patch body:
/// missing is `None`, `null` is `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        title: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_tells_null_from_missing() {
        let missing: Patch = serde_json::from_value(json!({})).unwrap();
        let cleared: Patch = serde_json::from_value(json!({"title": null})).unwrap();
        let set: Patch = serde_json::from_value(json!({"title": "x"})).unwrap();

        assert_eq!(missing.title, None);
        assert_eq!(cleared.title, Some(None));
        assert_eq!(set.title, Some(Some("x".to_string())));
    }
}
