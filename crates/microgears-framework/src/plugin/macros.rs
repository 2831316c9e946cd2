// ─── Internal helper: PluginMetadata builder ──────────────────────────────────
//
// Used exclusively by `define_plugin!`.  Not part of the public API.

/// Internal helper macro: builds a [`PluginMetadata`] from optional overrides.
///
/// # Internal calling convention
///
/// ```text
/// __plugin_metadata!(
///     @parse [$doc?]           ← captured doc literal
///            key: val, …       ← raw metadata tokens
/// )
/// ```
///
/// The remaining tokens travel inside a `{ … }` group, so every arm sees the
/// end of input as an empty group.
#[macro_export]
#[doc(hidden)]
macro_rules! __plugin_metadata {
    // Entry: receives doc comment and raw metadata tokens
    (@parse [$($doc:expr)?] $($meta:tt)*) => {
        $crate::__plugin_metadata!(
            @pm [$($doc)?] [] [] [] { $($meta)* }
        )
    };

    // TT-muncher: skip leading comma
    (@pm $doc:tt $ver:tt $dsc:tt $fd:tt { , $($rest:tt)* }) => {
        $crate::__plugin_metadata!(@pm $doc $ver $dsc $fd { $($rest)* })
    };

    // version: "..."
    (@pm $doc:tt [$($old:expr)?] $dsc:tt $fd:tt { version : $v:literal $($rest:tt)* }) => {
        $crate::__plugin_metadata!(@pm $doc [$v] $dsc $fd { $($rest)* })
    };

    // desc: "..."
    (@pm $doc:tt $ver:tt [$($old:expr)?] $fd:tt { desc : $v:literal $($rest:tt)* }) => {
        $crate::__plugin_metadata!(@pm $doc $ver [$v] $fd { $($rest)* })
    };

    // full_desc: "..."
    (@pm $doc:tt $ver:tt $dsc:tt [$($old:expr)?] { full_desc : $v:literal $($rest:tt)* }) => {
        $crate::__plugin_metadata!(@pm $doc $ver $dsc [$v] { $($rest)* })
    };

    // Skip unknown ident:value pairs
    (@pm $doc:tt $ver:tt $dsc:tt $fd:tt { $ident:ident : $value:tt $($rest:tt)* }) => {
        $crate::__plugin_metadata!(@pm $doc $ver $dsc $fd { $($rest)* })
    };

    // End of tokens → emit
    (@pm [$($doc:expr)?] [$($ver:expr)?] [$($dsc:expr)?] [$($fd:expr)?] { }) => {
        $crate::plugin::PluginMetadata {
            version:   $crate::__plugin_metadata!(@get_ver [$($ver)?]),
            desc:      $crate::__plugin_metadata!(@get_dsc [$($dsc)?]),
            full_desc: $crate::__plugin_metadata!(@get_fd [$($fd)?] [$($doc)?]),
        }
    };

    // @get_ver
    (@get_ver []) => { ::std::env!("CARGO_PKG_VERSION") };
    (@get_ver [$ver:expr]) => { $ver };

    // @get_dsc
    (@get_dsc []) => { ::std::env!("CARGO_PKG_DESCRIPTION") };
    (@get_dsc [$dsc:expr]) => { $dsc };

    // @get_fd: explicit > doc > None
    (@get_fd [$fd:expr] [$($_doc:expr)?]) => { ::std::option::Option::Some($fd) };
    (@get_fd [] [$doc:expr]) => { ::std::option::Option::Some($doc) };
    (@get_fd [] []) => { ::std::option::Option::None };
}

// ─── define_plugin! ──────────────────────────────────────────────────────────

/// Creates a [`PluginDescriptor`], the static, `Copy` handle to a plugin.
///
/// # Syntax
///
/// ```rust,ignore
/// use microgears::prelude::*;
///
/// fn weird(args: Args, _ctx: &HookContext) -> Step<Args> {
///     let text = args.arg::<String>(0).unwrap_or_default();
///     Step::ok(args.with(0, format!("{text} weird")))
/// }
///
/// fn these_days(result: Value, _ctx: &HookContext) -> Step<Value> {
///     Step::ok(json!(format!("{} these days", result.as_str().unwrap_or_default())))
/// }
///
/// /// Adds flavour to every call.
/// pub static FLAVOUR: PluginDescriptor = define_plugin! {
///     name: "flavour",
///     before_chain: weird,
///     after_chain: these_days,
///     metadata: {
///         version: "2.0.0",
///         desc:    "Short description.",
///     },
/// };
///
/// gears.add_plugin(FLAVOUR)?;
/// ```
///
/// ## Field reference
///
/// | Field | Required | Description |
/// |-------|----------|-------------|
/// | `name` | ✓ | Must be **first**. Plugin name and registry key. |
/// | `before_chain` | | `fn(Args, &HookContext) -> Step<Args>` |
/// | `after_chain` | | `fn(Value, &HookContext) -> Step<Value>` |
/// | `metadata` | | `{ version, desc, full_desc }`, must be last |
///
/// A descriptor without hooks compiles, but the registry rejects it with
/// `RegistryError::InvalidPlugin`.
///
/// [`PluginDescriptor`]: crate::plugin::PluginDescriptor
#[macro_export]
macro_rules! define_plugin {
    // ── Entry: with doc comment ───────────────────────────────────────────────
    //
    // Accumulator slots (4 total):
    //   [$n]        plugin name literal
    //   [$($b)?]    before_chain expression
    //   [$($a)?]    after_chain expression
    //   [$($doc)?]  doc literal
    ($(#[doc = $doc:literal])+ name: $name:literal, $($tail:tt)+) => {
        $crate::define_plugin!(
            @acc [$name] [] [] [::std::concat!($($doc, " "),*)]
            $($tail)+
        )
    };

    // ── Entry: no doc + more fields ───────────────────────────────────────────
    (name: $name:literal, $($tail:tt)+) => {
        $crate::define_plugin!(
            @acc [$name] [] [] []
            $($tail)+
        )
    };

    // ── Entry: name only ──────────────────────────────────────────────────────
    (name: $name:literal $(,)?) => {
        $crate::define_plugin!(
            @acc [$name] [] [] []
        )
    };

    // ── Accumulator: skip stray commas ────────────────────────────────────────
    (@acc $n:tt $b:tt $a:tt $doc:tt
        , $($rest:tt)*
    ) => {
        $crate::define_plugin!(
            @acc $n $b $a $doc
            $($rest)*
        )
    };

    // ── Consume before_chain: expr , <more fields> ────────────────────────────
    (@acc $n:tt [] $a:tt $doc:tt
        before_chain: $b:expr , $($rest:tt)*
    ) => {
        $crate::define_plugin!(
            @acc $n [$b] $a $doc
            $($rest)*
        )
    };

    // ── Consume before_chain: expr (last field) ───────────────────────────────
    (@acc $n:tt [] $a:tt $doc:tt
        before_chain: $b:expr
    ) => {
        $crate::define_plugin!(
            @acc $n [$b] $a $doc
        )
    };

    // ── Consume after_chain: expr , <more fields> ─────────────────────────────
    (@acc $n:tt $b:tt [] $doc:tt
        after_chain: $a:expr , $($rest:tt)*
    ) => {
        $crate::define_plugin!(
            @acc $n $b [$a] $doc
            $($rest)*
        )
    };

    // ── Consume after_chain: expr (last field) ────────────────────────────────
    (@acc $n:tt $b:tt [] $doc:tt
        after_chain: $a:expr
    ) => {
        $crate::define_plugin!(
            @acc $n $b [$a] $doc
        )
    };

    // ── Consume metadata: { … } ───────────────────────────────────────────────
    (@acc $n:tt $b:tt $a:tt $doc:tt
        metadata: { $($meta:tt)* } $(,)?
    ) => {
        $crate::define_plugin!(
            @terminal $n $b $a $doc $($meta)*
        )
    };

    // ── No remaining fields → terminal ────────────────────────────────────────
    (@acc $n:tt $b:tt $a:tt $doc:tt) => {
        $crate::define_plugin!(
            @terminal $n $b $a $doc
        )
    };

    // ── @terminal: emit the PluginDescriptor ─────────────────────────────────
    (
        @terminal [$n:literal] [$($b:expr)?] [$($a:expr)?] [$($doc:expr)?] $($meta:tt)*
    ) => {{
        const __MICROGEARS_META: $crate::plugin::PluginMetadata =
            $crate::__plugin_metadata!(@parse [$($doc)?] $($meta)*);

        fn __microgears_plugin_create() -> $crate::plugin::Plugin {
            $crate::plugin::Plugin::__new(
                $n,
                {
                    #[allow(unused_mut)]
                    let mut __f: ::std::option::Option<$crate::plugin::BeforeHook> = None;
                    $( __f = Some(::std::sync::Arc::new($b)); )?
                    __f
                },
                {
                    #[allow(unused_mut)]
                    let mut __f: ::std::option::Option<$crate::plugin::AfterHook> = None;
                    $( __f = Some(::std::sync::Arc::new($a)); )?
                    __f
                },
                __MICROGEARS_META,
            )
        }

        $crate::plugin::PluginDescriptor {
            name:     $n,
            create:   __microgears_plugin_create,
            metadata: __MICROGEARS_META,
        }
    }};
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use microgears_core::{Args, Step};

    use crate::context::HookContext;
    use crate::plugin::PluginDescriptor;

    fn pass_args(args: Args, _ctx: &HookContext) -> Step<Args> {
        Step::ok(args)
    }

    fn tag_result(result: Value, _ctx: &HookContext) -> Step<Value> {
        Step::ok(json!({ "tagged": result }))
    }

    /// Tags every result.
    static TAGGER: PluginDescriptor = define_plugin! {
        name: "tagger",
        before_chain: pass_args,
        after_chain: tag_result,
        metadata: {
            version: "1.2.3",
            desc: "tags results",
        },
    };

    static AFTER_ONLY: PluginDescriptor = define_plugin! {
        name: "after_only",
        after_chain: tag_result,
    };

    static NO_HOOKS: PluginDescriptor = define_plugin! {
        name: "no_hooks",
    };

    static DOCUMENTED: PluginDescriptor = define_plugin! {
        /// Wraps results.
        name: "documented",
        after_chain: tag_result,
        metadata: {
            desc: "short",
            homepage: "https://example.invalid",
            version: "0.1.0"
        },
    };

    static EXPLICIT_FULL: PluginDescriptor = define_plugin! {
        /// Overridden doc.
        name: "explicit_full",
        before_chain: pass_args,
        metadata: { full_desc: "long text", version: "3.0.0", },
    };

    #[test]
    fn test_descriptor_fields() {
        assert_eq!(TAGGER.name, "tagger");
        assert_eq!(TAGGER.metadata.version, "1.2.3");
        assert_eq!(TAGGER.metadata.desc, "tags results");
        assert_eq!(TAGGER.metadata.full_desc, None);
    }

    #[test]
    fn test_metadata_keys_in_any_order() {
        assert_eq!(DOCUMENTED.metadata.version, "0.1.0");
        assert_eq!(DOCUMENTED.metadata.desc, "short");
        assert_eq!(
            DOCUMENTED.metadata.full_desc.map(str::trim),
            Some("Wraps results.")
        );

        assert_eq!(EXPLICIT_FULL.metadata.version, "3.0.0");
        assert_eq!(EXPLICIT_FULL.metadata.desc, env!("CARGO_PKG_DESCRIPTION"));
        assert_eq!(EXPLICIT_FULL.metadata.full_desc, Some("long text"));
    }

    #[test]
    fn test_instantiate_carries_hooks() {
        let plugin = TAGGER.instantiate();
        assert_eq!(plugin.name(), "tagger");
        assert!(plugin.has_before());
        assert!(plugin.has_after());

        let plugin = AFTER_ONLY.instantiate();
        assert!(!plugin.has_before());
        assert!(plugin.has_after());
        assert_eq!(plugin.metadata().version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_descriptor_without_hooks_fails_validation() {
        assert!(NO_HOOKS.instantiate().validate().is_err());
    }
}
