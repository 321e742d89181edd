//! Localization boundary for schema descriptions.
//!
//! Human-facing text is looked up by stable message id. Authored documentation
//! (`title`, `contents`) never passes through here.

/// Host-provided localization function.
pub trait Localizer: Send + Sync {
    /// Returns display text for `key`, falling back to `fallback`. `{0}`,
    /// `{1}`... placeholders are replaced by `args`.
    fn localize(&self, key: &str, fallback: &str, args: &[&str]) -> String;
}

/// Localizer that always returns the fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackLocalizer;

impl Localizer for FallbackLocalizer {
    fn localize(&self, _key: &str, fallback: &str, args: &[&str]) -> String {
        format_placeholders(fallback, args)
    }
}

impl<F> Localizer for F
where
    F: Fn(&str, &str, &[&str]) -> String + Send + Sync,
{
    fn localize(&self, key: &str, fallback: &str, args: &[&str]) -> String {
        self(key, fallback, args)
    }
}

const DOCUMENTATION_MESSAGES: &[(&str, &str)] = &[
    ("contributes.documentation", "Contributed documentation."),
    (
        "contributes.documentation.refactorings",
        "Contributed documentation for refactorings.",
    ),
    (
        "contributes.documentation.refactoring",
        "Contributed documentation for refactoring.",
    ),
    (
        "contributes.documentation.refactoring.title",
        "Label for the documentation used in the UI.",
    ),
    ("contributes.documentation.refactoring.when", "When clause."),
    (
        "contributes.documentation.refactoring.command",
        "Command executed.",
    ),
    (
        "contributes.documentation.views",
        "Contributed documentation for views.",
    ),
    (
        "contributes.documentation.view",
        "Contributed documentation for a view.",
    ),
    (
        "contributes.documentation.view.view",
        "View identifier for this documentation.",
    ),
    (
        "contributes.documentation.view.contents",
        "Documentation contents.",
    ),
    ("contributes.documentation.view.when", "When clause."),
];

/// Source-language fallback text for a documentation schema message id.
pub fn message_fallback(key: &str) -> Option<&'static str> {
    DOCUMENTATION_MESSAGES
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, text)| *text)
}

/// Localizes one schema message id; unknown ids render as the id itself.
pub fn describe(localizer: &dyn Localizer, key: &str) -> String {
    localizer.localize(key, message_fallback(key).unwrap_or(key), &[])
}

fn format_placeholders(template: &str, args: &[&str]) -> String {
    let mut output = template.to_string();
    for (index, arg) in args.iter().enumerate() {
        output = output.replace(&format!("{{{index}}}"), arg);
    }
    output
}
