//! Method-call translator registry.
//!
//! Each [`MethodCallTranslator`] recognizes a family of host methods and
//! builds the equivalent PartiQL expression. The provider asks plugin
//! translators first, then the built-ins, and returns the first match.

use crate::ast::{ExpressionFactory, PartiqlExpr};
use crate::host::MethodRef;
use crate::model::{HostType, Model};

/// Translates calls of one family of host methods.
///
/// `instance` and `args` are already translated. Returning `None` means
/// "not mine"; the next translator is tried.
pub trait MethodCallTranslator: Send + Sync {
    fn translate(
        &self,
        model: &Model,
        instance: &PartiqlExpr,
        method: &MethodRef,
        args: &[PartiqlExpr],
    ) -> Option<PartiqlExpr>;
}

/// A bundle of translators contributed from outside the crate.
pub trait MethodCallTranslatorPlugin: Send + Sync {
    fn translators(&self) -> Vec<Box<dyn MethodCallTranslator>>;
}

/// Resolves a method call against every registered translator.
pub trait MethodCallTranslatorProvider: Send + Sync {
    fn translate(
        &self,
        model: &Model,
        instance: &PartiqlExpr,
        method: &MethodRef,
        args: &[PartiqlExpr],
    ) -> Option<PartiqlExpr>;
}

/// The default provider: plugin translators in registration order, then
/// [`StringMethodsTranslator`].
pub struct PartiqlMethodCallTranslatorProvider {
    translators: Vec<Box<dyn MethodCallTranslator>>,
}

impl Default for PartiqlMethodCallTranslatorProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PartiqlMethodCallTranslatorProvider {
    pub fn new(plugins: Vec<Box<dyn MethodCallTranslatorPlugin>>) -> Self {
        let mut translators: Vec<Box<dyn MethodCallTranslator>> = plugins
            .iter()
            .flat_map(|plugin| plugin.translators())
            .collect();
        translators.push(Box::new(StringMethodsTranslator::default()));
        Self { translators }
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

impl MethodCallTranslatorProvider for PartiqlMethodCallTranslatorProvider {
    fn translate(
        &self,
        model: &Model,
        instance: &PartiqlExpr,
        method: &MethodRef,
        args: &[PartiqlExpr],
    ) -> Option<PartiqlExpr> {
        let translated = self
            .translators
            .iter()
            .find_map(|t| t.translate(model, instance, method, args));
        match &translated {
            Some(expr) => tracing::trace!("Method '{}' translated to {}", method, expr),
            None => tracing::debug!(
                "No translator for method '{}' on {}",
                method,
                instance.host_type()
            ),
        }
        translated
    }
}

/// `string.StartsWith(s)` → `BEGINS_WITH`, `string.Contains(s)` → `CONTAINS`.
#[derive(Debug, Default)]
pub struct StringMethodsTranslator {
    factory: ExpressionFactory,
}

impl StringMethodsTranslator {
    pub fn new(factory: ExpressionFactory) -> Self {
        Self { factory }
    }
}

impl MethodCallTranslator for StringMethodsTranslator {
    fn translate(
        &self,
        _model: &Model,
        instance: &PartiqlExpr,
        method: &MethodRef,
        args: &[PartiqlExpr],
    ) -> Option<PartiqlExpr> {
        if method.declaring_type.is_some() || instance.host_type() != HostType::String {
            return None;
        }
        let [arg] = args else {
            return None;
        };
        if !matches!(arg.host_type(), HostType::String | HostType::Char) {
            return None;
        }

        match method.name.as_str() {
            "StartsWith" => Some(self.factory.begins_with(instance.clone(), arg.clone())),
            "Contains" => Some(self.factory.contains(instance.clone(), arg.clone())),
            _ => None,
        }
    }
}
