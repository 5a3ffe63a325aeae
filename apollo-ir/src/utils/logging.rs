/// This macro is a wrapper around `tracing::trace!` and should not be confused with our snapshot
/// testing. Its goal is to attach the serialized form of an IR value to a trace event so that
/// external tools can show how models and selection sets look while an operation is being built.
///
/// The snapshot is tagged with the type name of the value, the data is serialized with
/// serde_json, and the message literal that you pass in is added. EX:
/// ```ignore
/// snapshot!(model_group, "built response-based model group");
/// // Generates:
/// // trace!(snapshot = "IrModelGroup", data = "{ .. }", "built response-based model group");
/// ```
macro_rules! snapshot {
    ($value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(
            snapshot = std::any::type_name_of_val(&$value),
            data = serde_json::to_string(&$value).unwrap_or_default(),
            $msg
        );
    };
}

pub(crate) use snapshot;
