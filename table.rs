//! BreakpointTable: the static catalog of hook specifications keyed by
//! `(class, method, signature)`, per spec.md §4.1. Two tables exist
//! because the runtime offers two different attachment mechanisms: plain
//! bytecode-level breakpoints for ordinary Java methods
//! ([`BREAKPOINT_TABLE`]), and function-pointer substitution for methods
//! that are themselves implemented natively
//! ([`NATIVE_BREAKPOINT_TABLE`], handled by [`crate::native_binding`]).

use crate::handlers::{ArgExpandOp, HandlerKind, ReInvokeOp, TraceOnlyOp, UnsafeOffsetOp};
use crate::hook::{HookSpec, NativeHookSpec};

/// Entries hookable via a bytecode-offset-0 breakpoint (spec.md §4.2).
pub static BREAKPOINT_TABLE: &[HookSpec] = &[
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "forName",
        descriptor: "(Ljava/lang/String;)Ljava/lang/Class;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::ForName),
        optional: false,
        is_static: true,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getField",
        descriptor: "(Ljava/lang/String;)Ljava/lang/reflect/Field;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetField),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredField",
        descriptor: "(Ljava/lang/String;)Ljava/lang/reflect/Field;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetDeclaredField),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getMethod",
        descriptor: "(Ljava/lang/String;[Ljava/lang/Class;)Ljava/lang/reflect/Method;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetMethod),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredMethod",
        descriptor: "(Ljava/lang/String;[Ljava/lang/Class;)Ljava/lang/reflect/Method;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetDeclaredMethod),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getConstructor",
        descriptor: "([Ljava/lang/Class;)Ljava/lang/reflect/Constructor;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetConstructor),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredConstructor",
        descriptor: "([Ljava/lang/Class;)Ljava/lang/reflect/Constructor;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetDeclaredConstructor),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getFields",
        descriptor: "()[Ljava/lang/reflect/Field;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetFields),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredFields",
        descriptor: "()[Ljava/lang/reflect/Field;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetDeclaredFields),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getMethods",
        descriptor: "()[Ljava/lang/reflect/Method;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetMethods),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredMethods",
        descriptor: "()[Ljava/lang/reflect/Method;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetDeclaredMethods),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getClasses",
        descriptor: "()[Ljava/lang/Class;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetClasses),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/Class",
        method_name: "getDeclaredClasses",
        descriptor: "()[Ljava/lang/Class;",
        handler: HandlerKind::TraceOnly(TraceOnlyOp::GetDeclaredClasses),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/ClassLoader",
        method_name: "getResource",
        descriptor: "(Ljava/lang/String;)Ljava/net/URL;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetResource),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/ClassLoader",
        method_name: "getResourceAsStream",
        descriptor: "(Ljava/lang/String;)Ljava/io/InputStream;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::GetResourceAsStream),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/invoke/MethodHandles$Lookup",
        method_name: "findStatic",
        descriptor:
            "(Ljava/lang/Class;Ljava/lang/String;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/MethodHandle;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::MethodHandleFindStatic),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/invoke/MethodHandles$Lookup",
        method_name: "findVirtual",
        descriptor:
            "(Ljava/lang/Class;Ljava/lang/String;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/MethodHandle;",
        handler: HandlerKind::ReInvoke(ReInvokeOp::MethodHandleFindVirtual),
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/lang/reflect/Proxy",
        method_name: "newProxyInstance",
        descriptor:
            "(Ljava/lang/ClassLoader;[Ljava/lang/Class;Ljava/lang/reflect/InvocationHandler;)Ljava/lang/Object;",
        handler: HandlerKind::ArgExpanding(ArgExpandOp::NewProxyInstance),
        optional: false,
        is_static: true,
    },
    HookSpec {
        class_name: "java/lang/reflect/Proxy",
        method_name: "getProxyClass",
        descriptor: "(Ljava/lang/ClassLoader;[Ljava/lang/Class;)Ljava/lang/Class;",
        handler: HandlerKind::ArgExpanding(ArgExpandOp::GetProxyClass),
        optional: true, // removed in newer JDKs in favor of newProxyInstance
        is_static: true,
    },
    HookSpec {
        class_name: "java/lang/invoke/MethodHandleProxies",
        method_name: "asInterfaceInstance",
        descriptor: "(Ljava/lang/Class;Ljava/lang/invoke/MethodHandle;)Ljava/lang/Object;",
        handler: HandlerKind::EnclosingMethod,
        optional: true,
        is_static: true,
    },
    HookSpec {
        class_name: "sun/misc/Unsafe",
        method_name: "objectFieldOffset",
        descriptor: "(Ljava/lang/reflect/Field;)J",
        handler: HandlerKind::UnsafeFieldOffset(UnsafeOffsetOp::ByField),
        optional: true,
        is_static: false,
    },
    HookSpec {
        class_name: "jdk/internal/misc/Unsafe",
        method_name: "objectFieldOffset",
        descriptor: "(Ljava/lang/Class;Ljava/lang/String;)J",
        handler: HandlerKind::UnsafeFieldOffset(UnsafeOffsetOp::ByClassAndName),
        optional: true,
        is_static: false,
    },
    HookSpec {
        class_name: "java/io/ObjectStreamClass",
        method_name: "<init>",
        descriptor: "(Ljava/lang/Class;)V",
        handler: HandlerKind::SerializationConstructor,
        optional: false,
        is_static: false,
    },
    HookSpec {
        class_name: "java/util/ResourceBundle",
        method_name: "getBundle",
        descriptor: "(Ljava/lang/String;)Ljava/util/ResourceBundle;",
        handler: HandlerKind::ResourceBundle,
        optional: false,
        is_static: true,
    },
];

/// Entries hookable only by substituting the native entry point
/// (spec.md §4.3).
pub static NATIVE_BREAKPOINT_TABLE: &[NativeHookSpec] = &[NativeHookSpec {
    class_name: "sun/misc/Unsafe",
    method_name: "objectFieldOffset0",
    descriptor: "(Ljava/lang/reflect/Field;)J",
    handler: HandlerKind::UnsafeFieldOffset(UnsafeOffsetOp::Native),
    optional: true,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_regular_entry_has_a_unique_class_method_descriptor_triple() {
        let mut seen = std::collections::HashSet::new();
        for spec in BREAKPOINT_TABLE {
            let key = (spec.class_name, spec.method_name, spec.descriptor);
            assert!(seen.insert(key), "duplicate table entry: {key:?}");
        }
    }

    #[test]
    fn native_table_entries_are_marked_optional_when_jdk_version_dependent() {
        for spec in NATIVE_BREAKPOINT_TABLE {
            assert!(spec.optional, "{}.{} should be optional", spec.class_name, spec.method_name);
        }
    }
}
