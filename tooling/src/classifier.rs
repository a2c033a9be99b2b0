//! Reverse mapping from a flat key to the factory, instance and parameter it
//! configures.
//!
//! Rules are tried in order and the first match wins:
//!
//! | Rule | Shape (root stripped) | Example |
//! |------|-----------------------|---------|
//! | [`MatchRule::Factory`] | `<factory>.<property>` | `jdbc.url` |
//! | [`MatchRule::BeanKind`] | `<kind>.<property>` | `ollama.model.name` |
//! | [`MatchRule::PrefixedFactory`] | `<instance>.<factory>.<property>` | `myPG.jdbc.url` |
//! | [`MatchRule::PrefixedBeanKind`] | `<instance>.<kind>.<property>` | `chat.ollama.base.url` |
//! | [`MatchRule::PrefixedPropertyPrefix`] | `<instance>.<alias>...` | `sessions.hotrod.client.server.list` |
//! | [`MatchRule::PropertyPrefix`] | `<alias>...` | `hotrod.client.server.list` |
//!
//! Anything else is not a configuration key and is skipped by callers.

use forage_config::ROOT_TOKEN;

use crate::catalog::Catalog;

/// `key` without the leading root token, if present.
pub fn strip_root(key: &str) -> &str {
    key.strip_prefix(ROOT_TOKEN).unwrap_or(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Factory,
    BeanKind,
    PrefixedFactory,
    PrefixedBeanKind,
    PrefixedPropertyPrefix,
    PropertyPrefix,
}

/// Classification of one flat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub factory_type: String,
    pub instance_name: Option<String>,
    pub bean_kind: Option<String>,
    /// Never empty. For alias matches this is the root-stripped key after
    /// the instance segment, alias included.
    pub property_name: String,
    /// Segment that identified the factory (factory key or bean kind).
    pub segment: String,
    pub rule: MatchRule,
}

impl ParsedKey {
    /// `forage.[instance.]<segment>.<property>`, or `forage.[instance.]<key>`
    /// for alias matches.
    pub fn canonical_key(&self, instance: Option<&str>) -> String {
        let mut key = String::from(ROOT_TOKEN);
        if let Some(instance) = instance.filter(|i| !i.is_empty()) {
            key.push_str(instance);
            key.push('.');
        }
        if !matches!(
            self.rule,
            MatchRule::PropertyPrefix | MatchRule::PrefixedPropertyPrefix
        ) {
            key.push_str(&self.segment);
            key.push('.');
        }
        key.push_str(&self.property_name);
        key
    }
}

/// Classifies flat keys against a [`Catalog`].
#[derive(Debug, Clone, Copy)]
pub struct KeyClassifier<'c> {
    catalog: &'c Catalog,
}

impl<'c> KeyClassifier<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Classify `key`; the root token is stripped first if present.
    pub fn classify(&self, key: &str) -> Option<ParsedKey> {
        let key = strip_root(key);
        let (first, rest) = key.split_once('.')?;
        if first.is_empty() || rest.is_empty() {
            return None;
        }

        if let Some(factory) = self.catalog.factory(first) {
            return Some(ParsedKey {
                factory_type: factory.key.clone(),
                instance_name: None,
                bean_kind: None,
                property_name: rest.to_string(),
                segment: first.to_string(),
                rule: MatchRule::Factory,
            });
        }
        if let Some(factory) = self.catalog.owner_of_bean_kind(first) {
            return Some(ParsedKey {
                factory_type: factory.key.clone(),
                instance_name: None,
                bean_kind: Some(first.to_string()),
                property_name: rest.to_string(),
                segment: first.to_string(),
                rule: MatchRule::BeanKind,
            });
        }

        if let Some((second, remainder)) = rest.split_once('.')
            && !remainder.is_empty()
        {
            if let Some(factory) = self.catalog.factory(second) {
                return Some(ParsedKey {
                    factory_type: factory.key.clone(),
                    instance_name: Some(first.to_string()),
                    bean_kind: None,
                    property_name: remainder.to_string(),
                    segment: second.to_string(),
                    rule: MatchRule::PrefixedFactory,
                });
            }
            if let Some(factory) = self.catalog.owner_of_bean_kind(second) {
                return Some(ParsedKey {
                    factory_type: factory.key.clone(),
                    instance_name: Some(first.to_string()),
                    bean_kind: Some(second.to_string()),
                    property_name: remainder.to_string(),
                    segment: second.to_string(),
                    rule: MatchRule::PrefixedBeanKind,
                });
            }
            if let Some(factory) = self.catalog.factory_for_alias(second) {
                return Some(ParsedKey {
                    factory_type: factory.key.clone(),
                    instance_name: Some(first.to_string()),
                    bean_kind: None,
                    property_name: rest.to_string(),
                    segment: second.to_string(),
                    rule: MatchRule::PrefixedPropertyPrefix,
                });
            }
        }

        self.catalog.factory_for_alias(first).map(|factory| ParsedKey {
            factory_type: factory.key.clone(),
            instance_name: None,
            bean_kind: None,
            property_name: key.to_string(),
            segment: first.to_string(),
            rule: MatchRule::PropertyPrefix,
        })
    }
}
