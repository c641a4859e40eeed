//! The transformer contract: the boundary the core rewriter invokes to
//! map original values to replacement values. Modeled as a trait with
//! no-op default methods (the "default no-op implementation" of
//! spec.md §4.9) rather than a class hierarchy -- concrete policies in
//! [crate::policies] override only the hooks they care about.

use crate::namekind::NameKind;

/// Per-kind and scalar/bulk value hooks. Object-safe so the CLI can pick
/// a policy by name at runtime and hold it as `Box<dyn Transformer>`.
///
/// String hooks: returning `None` or a string equal to the input means
/// "no change," and the rewriter emits the original bytes verbatim
/// rather than a re-encoding (see [crate::pipeline]), even if
/// re-encoding would happen to produce identical bytes.
pub trait Transformer {
    fn transform_class_name(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_field_name(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_source_file_name(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_thread_name(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_thread_group_name(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_thread_group_parent_name(&self, _original: &str) -> Option<String> {
        None
    }

    /// Handles method names, method signatures, and any symbol with no
    /// observed kind -- hprof doesn't always allow method name and
    /// signature to be told apart at the point of transformation, so
    /// both route here alongside the generic fallback.
    fn transform_utf8_string(&self, _original: &str) -> Option<String> {
        None
    }

    fn transform_boolean(&self, value: bool) -> bool {
        value
    }

    fn transform_byte(&self, value: i8) -> i8 {
        value
    }

    fn transform_short(&self, value: i16) -> i16 {
        value
    }

    fn transform_char(&self, value: u16) -> u16 {
        value
    }

    fn transform_int(&self, value: i32) -> i32 {
        value
    }

    fn transform_long(&self, value: i64) -> i64 {
        value
    }

    fn transform_float(&self, value: f32) -> f32 {
        value
    }

    fn transform_double(&self, value: f64) -> f64 {
        value
    }

    /// Bulk hooks exist so a policy can do a memset-style zeroing
    /// without forcing the rewriter to unroll. Default is per-element
    /// application in ascending index order.
    fn transform_boolean_array(&self, values: &mut [bool]) {
        for v in values.iter_mut() {
            *v = self.transform_boolean(*v);
        }
    }

    fn transform_byte_array(&self, values: &mut [i8]) {
        for v in values.iter_mut() {
            *v = self.transform_byte(*v);
        }
    }

    fn transform_short_array(&self, values: &mut [i16]) {
        for v in values.iter_mut() {
            *v = self.transform_short(*v);
        }
    }

    fn transform_char_array(&self, values: &mut [u16]) {
        for v in values.iter_mut() {
            *v = self.transform_char(*v);
        }
    }

    fn transform_int_array(&self, values: &mut [i32]) {
        for v in values.iter_mut() {
            *v = self.transform_int(*v);
        }
    }

    fn transform_long_array(&self, values: &mut [i64]) {
        for v in values.iter_mut() {
            *v = self.transform_long(*v);
        }
    }

    fn transform_float_array(&self, values: &mut [f32]) {
        for v in values.iter_mut() {
            *v = self.transform_float(*v);
        }
    }

    fn transform_double_array(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = self.transform_double(*v);
        }
    }
}

/// Routes a decoded UTF-8 record body to the hook matching its
/// classified [NameKind] (or the generic hook if it has none).
pub fn dispatch_string(
    transformer: &dyn Transformer,
    kind: Option<NameKind>,
    original: &str,
) -> Option<String> {
    match kind {
        Some(NameKind::ClassName) => transformer.transform_class_name(original),
        Some(NameKind::FieldName) => transformer.transform_field_name(original),
        Some(NameKind::SourceFileName) => transformer.transform_source_file_name(original),
        Some(NameKind::ThreadName) => transformer.transform_thread_name(original),
        Some(NameKind::ThreadGroupName) => transformer.transform_thread_group_name(original),
        Some(NameKind::ThreadGroupParentName) => {
            transformer.transform_thread_group_parent_name(original)
        }
        Some(NameKind::MethodNameOrSignature) | None => {
            transformer.transform_utf8_string(original)
        }
    }
}

/// The no-op transformer: every hook falls through to the trait
/// defaults, so `filter()` with this transformer is a byte-identical
/// round trip (invariant 1 of spec.md §8).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransformer;

impl Transformer for NoopTransformer {}
