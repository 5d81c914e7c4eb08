use crate::error::MutateError;
use crate::mutant::MutationSite;
use crate::source::{SourceUnit, write_source};
use crate::span::SourceSpan;

/// Apply a single textual replacement to `code` based on `span`.
///
/// The `span` offsets are byte indices into `code`.
pub fn apply_span_patch(code: &str, span: &SourceSpan, replacement: &str) -> String {
    let start = span.start as usize;
    let end = span.end as usize;

    debug_assert!(
        start <= end && end <= code.len(),
        "span [{start}, {end}) is out of bounds for code length {}",
        code.len()
    );

    let mut out = String::with_capacity(
        code.len() + replacement.len().saturating_sub(end.saturating_sub(start)),
    );

    out.push_str(&code[..start]);
    out.push_str(replacement);
    out.push_str(&code[end..]);

    out
}

/// Apply a replacement after verifying that the spanned slice equals `expected_original`.
pub fn apply_checked_patch(
    code: &str,
    span: &SourceSpan,
    expected_original: &str,
    replacement: &str,
) -> Result<String, MutateError> {
    let start = span.start as usize;
    let end = span.end as usize;

    if code.get(start..end) != Some(expected_original) {
        return Err(MutateError::SpanMismatch {
            file: span.file.clone(),
            start: span.start,
            end: span.end,
            expected: expected_original.to_string(),
        });
    }

    Ok(apply_span_patch(code, span, replacement))
}

/// Mutated source text for `site`, computed from the pristine text of `unit`.
pub fn mutated_text(unit: &SourceUnit, site: &MutationSite) -> Result<String, MutateError> {
    apply_checked_patch(
        unit.text(),
        &site.span,
        site.operator().symbol(),
        site.replacement().symbol(),
    )
}

/// Write the mutated text for `site` to the staged file.
///
/// The returned token restores the pristine text when reverted, or when
/// dropped without being reverted, so the file never stays mutated on an
/// early return.
pub fn apply<'u>(unit: &'u SourceUnit, site: &MutationSite) -> Result<AppliedMutation<'u>, MutateError> {
    let mutated = mutated_text(unit, site)?;

    // Arm the token before writing so a partial write is also restored.
    let applied = AppliedMutation {
        unit,
        reverted: false,
    };
    write_source(unit.path(), &mutated)?;

    Ok(applied)
}

/// A mutation currently on disk.
#[must_use = "dropping the token reverts the mutation immediately"]
pub struct AppliedMutation<'u> {
    unit: &'u SourceUnit,
    reverted: bool,
}

impl AppliedMutation<'_> {
    /// Re-write the pristine text.
    ///
    /// On error the token stays armed and retries when dropped.
    pub fn revert(&mut self) -> Result<(), MutateError> {
        self.unit.write_pristine()?;
        self.reverted = true;
        Ok(())
    }
}

impl Drop for AppliedMutation<'_> {
    fn drop(&mut self) {
        if !self.reverted {
            // Best effort; the explicit `revert` path reports write errors.
            let _ = self.unit.write_pristine();
        }
    }
}
