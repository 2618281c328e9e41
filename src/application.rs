use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Metadata about the application that is propagated as point tags.
///
/// Application and service are mandatory; cluster and shard are optional
/// and reported as `none` when absent.
///
/// # Examples
///
/// ```
/// use wavefront_runtime_reporter::ApplicationTags;
///
/// let tags = ApplicationTags::new("billing", "invoicer")
///     .with_shard("primary")
///     .with_custom_tag("team", "payments");
/// assert_eq!(tags.application(), "billing");
/// assert_eq!(tags.cluster(), None);
/// assert_eq!(tags.shard(), Some("primary"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationTags {
    application: String,
    service: String,
    cluster: Option<String>,
    shard: Option<String>,
    custom_tags: BTreeMap<String, String>,
}

impl ApplicationTags {
    /// Creates application metadata with the two mandatory fields.
    pub fn new(application: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            service: service.into(),
            ..Default::default()
        }
    }

    /// Sets the cluster the application runs in.
    #[must_use]
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Sets the shard the application runs in.
    #[must_use]
    pub fn with_shard(mut self, shard: impl Into<String>) -> Self {
        self.shard = Some(shard.into());
        self
    }

    /// Adds a custom tag.
    ///
    /// Custom tags named like one of the reserved keys are ignored when the
    /// point tags are composed.
    #[must_use]
    pub fn with_custom_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_tags.insert(key.into(), value.into());
        self
    }

    /// Adds several custom tags at once.
    #[must_use]
    pub fn with_custom_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The application name.
    pub fn application(&self) -> &str {
        &self.application
    }

    /// The service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The cluster name, if any.
    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    /// The shard name, if any.
    pub fn shard(&self) -> Option<&str> {
        self.shard.as_deref()
    }

    /// The custom tags.
    pub fn custom_tags(&self) -> &BTreeMap<String, String> {
        &self.custom_tags
    }

    /// Checks that the mandatory fields are present.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.application.trim().is_empty() {
            return Err(ConfigError::MissingApplication);
        }
        if self.service.trim().is_empty() {
            return Err(ConfigError::MissingService);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ApplicationTags::new("app", "svc").validate().is_ok());
        assert_eq!(
            ApplicationTags::new("", "svc").validate(),
            Err(ConfigError::MissingApplication)
        );
        assert_eq!(
            ApplicationTags::new("app", "  ").validate(),
            Err(ConfigError::MissingService)
        );
    }

    #[test]
    fn test_custom_tags_accumulate() {
        let tags = ApplicationTags::new("app", "svc")
            .with_custom_tag("a", "1")
            .with_custom_tags([("b", "2"), ("a", "3")]);
        assert_eq!(tags.custom_tags().len(), 2);
        assert_eq!(tags.custom_tags()["a"], "3");
    }
}
