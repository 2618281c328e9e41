//! Composition of the point tags attached to every reported metric.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::application::ApplicationTags;
use crate::constants::{
    APPLICATION_TAG_KEY, CLUSTER_TAG_KEY, RESERVED_TAG_KEYS, SERVICE_TAG_KEY, SHARD_TAG_KEY,
};
use crate::error::ConfigError;

/// The immutable set of point tags of a reporter.
///
/// Always contains the `application`, `service`, `cluster` and `shard` keys.
/// There is no way to modify a `PointTags` once it has been composed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PointTags {
    tags: BTreeMap<String, String>,
}

impl PointTags {
    /// Returns the value of a tag.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Iterates over the tags in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.tags.iter()
    }

    /// The number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the tags as a plain map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl<'a> IntoIterator for &'a PointTags {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Returns `true` for the keys that custom tags can never override.
pub(crate) fn is_reserved_key(key: &str) -> bool {
    RESERVED_TAG_KEYS.contains(&key)
}

/// The reserved tags of an application: its name, service, cluster and shard.
pub(crate) fn identity_tags(
    application: &ApplicationTags,
    null_tag_value: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            APPLICATION_TAG_KEY.to_owned(),
            application.application().to_owned(),
        ),
        (SERVICE_TAG_KEY.to_owned(), application.service().to_owned()),
        (
            CLUSTER_TAG_KEY.to_owned(),
            application.cluster().unwrap_or(null_tag_value).to_owned(),
        ),
        (
            SHARD_TAG_KEY.to_owned(),
            application.shard().unwrap_or(null_tag_value).to_owned(),
        ),
    ])
}

/// Builds the point tags for an application.
///
/// Missing cluster and shard values are replaced with `null_tag_value`.
/// Custom tags are merged in, except those whose key is one of the reserved
/// keys: those keep their reserved value.
///
/// # Examples
///
/// ```
/// use wavefront_runtime_reporter::{compose_point_tags, ApplicationTags, NULL_TAG_VAL};
///
/// let app = ApplicationTags::new("billing", "invoicer").with_custom_tag("service", "spoofed");
/// let tags = compose_point_tags(&app, NULL_TAG_VAL).unwrap();
/// assert_eq!(tags.get("service"), Some("invoicer"));
/// assert_eq!(tags.get("cluster"), Some("none"));
/// ```
pub fn compose_point_tags(
    application: &ApplicationTags,
    null_tag_value: &str,
) -> Result<PointTags, ConfigError> {
    application.validate()?;

    let mut tags = identity_tags(application, null_tag_value);
    for (key, value) in application.custom_tags() {
        if is_reserved_key(key) {
            wavefront_debug!("ignoring custom tag `{}`: the key is reserved", key);
            continue;
        }
        tags.insert(key.clone(), value.clone());
    }

    Ok(PointTags { tags })
}
