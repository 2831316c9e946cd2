use std::future::IntoFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::channel::oneshot;
use parking_lot::Mutex;
use serde_json::{Value, json};
use thiserror::Error;
use tokio_test::{assert_pending, assert_ready, task};

use microgears_core::{
    Args, BoxError, ChainStage, InvokeError, RegistryError, Step, UnexpectedDeferred, args,
};

use super::*;

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Error)]
#[error("user {0} not found")]
struct NotFound(u64);

/// Appends `before` to the first argument and `after` to the result.
fn suffix(name: &str, before: &'static str, after: &'static str) -> Plugin {
    Plugin::new(name)
        .before_chain(move |args, _| {
            let text = args.arg::<String>(0).unwrap_or_default();
            Step::ok(args.with(0, format!("{text}{before}")))
        })
        .after_chain(move |result, _| {
            Step::ok(json!(format!("{}{after}", result.as_str().unwrap_or_default())))
        })
}

/// Records every hook it runs as `before:<name>` / `after:<name>:<result>:<failed>`.
fn recorder(name: &'static str, log: &Log) -> Plugin {
    let before_log = log.clone();
    let after_log = log.clone();
    Plugin::new(name)
        .before_chain(move |args, _| {
            before_log.lock().push(format!("before:{name}"));
            Step::ok(args)
        })
        .after_chain(move |result, ctx| {
            after_log
                .lock()
                .push(format!("after:{name}:{result}:{}", ctx.error().is_some()));
            Step::ok(result)
        })
}

/// Counts `beforeChain` invocations.
fn counter(name: &str, hits: &Arc<AtomicUsize>) -> Plugin {
    let hits = hits.clone();
    Plugin::new(name).before_chain(move |args, _| {
        hits.fetch_add(1, Ordering::SeqCst);
        Step::ok(args)
    })
}

fn happens(def: ServiceDefinition) -> ServiceDefinition {
    def.method("go", |_, args| {
        let text: String = args.arg(0)?;
        Ok(json!(format!("{text} happens")))
    })
}

fn failing_users() -> ServiceDefinition {
    ServiceDefinition::new("userService")
        .namespace("services.userservice")
        .method("findUserById", |_, args| Err(NotFound(args.arg(0)?).into()))
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hooks_wrap_target_in_registration_order() {
    let gears = MicroGears::new();
    gears.add_plugin(suffix("p1", " weird", " these days")).unwrap();
    gears.add_plugin(suffix("p2", " stuff", " a lot")).unwrap();
    let svc = gears
        .add_service(happens(ServiceDefinition::new("weird").namespace("services.weird")))
        .unwrap();

    let out = svc.call("go", args!["wtf"]).await.unwrap();
    assert_eq!(out, json!("wtf weird stuff happens a lot these days"));
}

#[test]
fn test_sync_service_keeps_the_same_order() {
    let gears = MicroGears::new();
    gears.add_plugin(suffix("p1", " weird", " these days")).unwrap();
    gears.add_plugin(suffix("p2", " stuff", " a lot")).unwrap();
    let svc = gears
        .add_service(happens(
            ServiceDefinition::new("weird").namespace("services.weird").sync(),
        ))
        .unwrap();

    let reply = svc.call("go", args!["wtf"]);
    assert!(reply.is_ready());
    assert_eq!(
        reply.ready().unwrap().unwrap(),
        json!("wtf weird stuff happens a lot these days")
    );
}

#[tokio::test]
async fn test_hooks_see_call_identity() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let gears = MicroGears::new();
    gears
        .add_plugin(Plugin::new("identity").before_chain(move |args, ctx| {
            let meta = ctx.meta();
            sink.lock().push(format!(
                "{}|{}|{}|{}",
                ctx.plugin_name(),
                meta.service_name(),
                meta.service_namespace(),
                meta.method_name()
            ));
            Step::ok(args)
        }))
        .unwrap();
    gears
        .add_service(
            ServiceDefinition::new("testService")
                .namespace("services.test")
                .method("ping", |_, _| Ok(json!("pong"))),
        )
        .unwrap();

    let out = gears.call("testService", "ping", ()).await.unwrap();
    assert_eq!(out, json!("pong"));
    assert_eq!(*seen.lock(), ["identity|testService|services.test|ping"]);
}

// ─── Immutability ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_caller_mutation_is_not_observed() {
    let gears = MicroGears::new();
    let svc = gears
        .add_service(
            ServiceDefinition::new("reader")
                .namespace("services.reader")
                .method("read", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    let mut user = json!({ "name": "clark" });
    let reply = svc.call("read", Args::freeze(std::slice::from_ref(&user)));
    user["name"] = json!("bruce");

    assert_eq!(reply.await.unwrap(), json!({ "name": "clark" }));
}

#[tokio::test]
async fn test_hook_rewrites_do_not_touch_caller_args() {
    let gears = MicroGears::new();
    gears
        .add_plugin(Plugin::new("rename").before_chain(|args, _| {
            Step::ok(args.with(0, json!({ "name": "diana" })))
        }))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("reader")
                .namespace("services.reader")
                .method("read", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    let original = args![{ "name": "clark" }];
    let out = svc.call("read", original.clone()).await.unwrap();
    assert_eq!(out["name"], "diana");
    assert_eq!(original[0], json!({ "name": "clark" }));
}

// ─── Deferred contract ───────────────────────────────────────────────────────

#[test]
fn test_async_reply_is_deferred_and_lazy() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::new();
    gears.add_plugin(counter("count", &hits)).unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    let reply = svc.call("echo", args![1]);
    assert!(reply.is_deferred());
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let mut call = task::spawn(reply.into_future());
    let out = assert_ready!(call.poll()).unwrap();
    assert_eq!(out, json!(1));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sync_reply_is_the_raw_value() {
    let gears = MicroGears::new();
    let svc = gears
        .add_service(
            ServiceDefinition::new("calc")
                .namespace("services.calc")
                .async_calls(false)
                .method("add", |_, args| {
                    Ok(json!(args.arg::<i64>(0)? + args.arg::<i64>(1)?))
                }),
        )
        .unwrap();

    let reply = svc.call("add", args![2, 3]);
    assert!(reply.is_ready());
    assert_eq!(reply.ready().unwrap().unwrap(), json!(5));
}

#[test]
fn test_sync_service_with_pending_target_defers_after_hooks() {
    let (tx, rx) = oneshot::channel::<Value>();
    let rx = Arc::new(Mutex::new(Some(rx)));
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("waiter")
                .namespace("services.waiter")
                .sync()
                .async_method("wait", move |_, _| {
                    let rx = rx.lock().take();
                    async move {
                        match rx {
                            Some(rx) => rx.await.map_err(BoxError::from),
                            None => Err(BoxError::from("already waited")),
                        }
                    }
                }),
        )
        .unwrap();

    let reply = svc.call("wait", ());
    assert!(reply.is_deferred());
    assert_eq!(*log.lock(), ["before:p1"]);

    let mut call = task::spawn(reply.into_future());
    assert_pending!(call.poll());
    assert_eq!(log.lock().len(), 1);

    tx.send(json!("done")).unwrap();
    assert!(call.is_woken());
    let out = assert_ready!(call.poll()).unwrap();
    assert_eq!(out, json!("done"));
    assert_eq!(*log.lock(), ["before:p1", r#"after:p1:"done":false"#]);
}

#[tokio::test]
async fn test_async_service_awaits_pending_hooks() {
    let gears = MicroGears::new();
    gears
        .add_plugin(
            Plugin::new("slow")
                .before_chain(|args, _| {
                    Step::defer(async move {
                        tokio::task::yield_now().await;
                        Ok::<_, BoxError>(args.with(0, "slow"))
                    })
                })
                .after_chain(|result, _| {
                    Step::defer(async move {
                        tokio::task::yield_now().await;
                        Ok::<_, BoxError>(json!([result, "after"]))
                    })
                }),
        )
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    assert_eq!(
        svc.call("echo", args!["fast"]).await.unwrap(),
        json!(["slow", "after"])
    );
}

#[test]
fn test_sync_service_rejects_pending_before_hook() {
    let ran = Arc::new(AtomicUsize::new(0));
    let target_ran = ran.clone();
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("outer", &log)).unwrap();
    gears
        .add_plugin(Plugin::new("lazy").before_chain(|args, _| {
            Step::defer(async move { Ok::<_, BoxError>(args) })
        }))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("calc")
                .namespace("services.calc")
                .sync()
                .method("one", move |_, _| {
                    target_ran.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(1))
                }),
        )
        .unwrap();

    let err = svc.call("one", ()).ready().unwrap().unwrap_err();
    assert_eq!(
        err.downcast_ref::<UnexpectedDeferred>(),
        Some(&UnexpectedDeferred {
            plugin: "lazy".into(),
            stage: ChainStage::Before,
        })
    );
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(*log.lock(), ["before:outer", "after:outer:null:true"]);
}

#[test]
fn test_sync_service_rejects_pending_after_hook() {
    let gears = MicroGears::new();
    gears
        .add_plugin(Plugin::new("lazy").after_chain(|result, _| {
            Step::defer(async move { Ok::<_, BoxError>(result) })
        }))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("calc")
                .namespace("services.calc")
                .sync()
                .method("one", |_, _| Ok(json!(1))),
        )
        .unwrap();

    let err = svc.call("one", ()).ready().unwrap().unwrap_err();
    let deferred = err.downcast_ref::<UnexpectedDeferred>().unwrap();
    assert_eq!(deferred.stage, ChainStage::After);
    assert_eq!(
        err.to_string(),
        "plugin 'lazy' returned a pending value from afterChain in a synchronous service"
    );
}

// ─── Error propagation ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_target_error_runs_every_after_hook() {
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    gears.add_plugin(recorder("p2", &log)).unwrap();
    let users = gears.add_service(failing_users()).unwrap();

    let err = users.call("findUserById", args![7]).await.unwrap_err();
    assert!(err.is::<NotFound>());
    assert_eq!(err.to_string(), "user 7 not found");
    assert_eq!(
        *log.lock(),
        ["before:p1", "before:p2", "after:p2:null:true", "after:p1:null:true"]
    );
}

#[test]
fn test_target_error_in_sync_service() {
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    let users = gears.add_service(failing_users().sync()).unwrap();

    let err = users
        .call("findUserById", args![3])
        .ready()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, InvokeError::Failed(_)));
    assert_eq!(err.downcast_ref::<NotFound>().map(|e| e.0), Some(3));
    assert_eq!(*log.lock(), ["before:p1", "after:p1:null:true"]);
}

#[tokio::test]
async fn test_before_hook_failure_skips_target_and_unwinds() {
    let log = Log::default();
    let after_log = log.clone();
    let ran = Arc::new(AtomicUsize::new(0));
    let target_ran = ran.clone();

    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    gears
        .add_plugin(
            Plugin::new("p2")
                .before_chain(|_, _| Step::err("rejected by p2"))
                .after_chain(move |result, ctx| {
                    after_log
                        .lock()
                        .push(format!("after:p2:{result}:{}", ctx.error().is_some()));
                    Step::ok(result)
                }),
        )
        .unwrap();
    gears.add_plugin(recorder("p3", &log)).unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("guarded")
                .namespace("services.guarded")
                .method("run", move |_, _| {
                    target_ran.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("ran"))
                }),
        )
        .unwrap();

    let err = svc.call("run", ()).await.unwrap_err();
    assert_eq!(err.to_string(), "rejected by p2");
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(
        *log.lock(),
        ["before:p1", "after:p2:null:true", "after:p1:null:true"]
    );
}

#[tokio::test]
async fn test_after_hook_failure_replaces_result() {
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    gears
        .add_plugin(Plugin::new("p2").after_chain(|_, _| Step::err("p2 after failed")))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("ok")
                .namespace("services.ok")
                .method("run", |_, _| Ok(json!("fine"))),
        )
        .unwrap();

    let err = svc.call("run", ()).await.unwrap_err();
    assert_eq!(err.to_string(), "p2 after failed");
    assert_eq!(*log.lock(), ["before:p1", "after:p1:null:true"]);
}

#[tokio::test]
async fn test_after_hook_failure_while_unwinding_keeps_original_error() {
    let log = Log::default();
    let gears = MicroGears::new();
    gears.add_plugin(recorder("p1", &log)).unwrap();
    gears
        .add_plugin(Plugin::new("p2").after_chain(|_, _| Step::err("p2 after failed")))
        .unwrap();
    let users = gears.add_service(failing_users()).unwrap();

    let err = users.call("findUserById", args![9]).await.unwrap_err();
    assert!(err.is::<NotFound>());
    assert_eq!(*log.lock(), ["before:p1", "after:p1:null:true"]);

    // same policy on the immediate path
    gears.remove_service("userService").unwrap();
    let users = gears.add_service(failing_users().sync()).unwrap();
    let err = users
        .call("findUserById", args![9])
        .ready()
        .unwrap()
        .unwrap_err();
    assert!(err.is::<NotFound>());
}

// ─── Private methods, fields, siblings ───────────────────────────────────────

#[test]
fn test_private_methods_bypass_plugins() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::new();
    gears.add_plugin(counter("count", &hits)).unwrap();
    gears
        .add_plugin(Plugin::new("plusOne").before_chain(|args, _| {
            let n = args.arg::<i64>(0).unwrap_or_default();
            Step::ok(args.with(0, n + 1))
        }))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("numbers")
                .namespace("services.numbers")
                .method("_raw", |_, args| Ok(args[0].clone()))
                .method("cooked", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    let reply = svc.call("_raw", args![1]);
    assert!(reply.is_ready());
    assert_eq!(reply.ready().unwrap().unwrap(), json!(1));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(gears.cached_chains(), 0);

    let out = tokio_test::block_on(svc.call("cooked", args![1]).into_future()).unwrap();
    assert_eq!(out, json!(2));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_custom_private_prefix() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::with_options(GearsOptions {
        private_prefix: "$".into(),
        ..GearsOptions::default()
    });
    gears.add_plugin(counter("count", &hits)).unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("s")
                .namespace("ns")
                .sync()
                .method("$internal", |_, _| Ok(json!(0)))
                .method("_public", |_, _| Ok(json!(1))),
        )
        .unwrap();

    assert_eq!(svc.intercepted_methods(), ["_public"]);
    svc.call("$internal", ()).ready().unwrap().unwrap();
    svc.call("_public", ()).ready().unwrap().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fields_and_sibling_calls() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::new();
    gears.add_plugin(counter("count", &hits)).unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("greeter")
                .namespace("services.greeter")
                .sync()
                .field("greeting", "hello")
                .method("greet", |ctx, args| {
                    let name: String = args.arg(0)?;
                    let greeting = ctx.field("greeting").and_then(Value::as_str).unwrap_or("hi");
                    Ok(json!(format!("{greeting} {name}")))
                })
                .method("greetTwice", |ctx, args| {
                    let once = ctx
                        .service()
                        .call("greet", args.clone())
                        .ready()
                        .ok_or("greet was deferred")??;
                    Ok(json!([once.clone(), once]))
                }),
        )
        .unwrap();

    let out = svc.call("greetTwice", args!["lois"]).ready().unwrap().unwrap();
    assert_eq!(out, json!(["hello lois", "hello lois"]));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!svc.has_method("greeting"));
}

#[tokio::test]
async fn test_inherited_methods_are_intercepted() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::new();
    gears.add_plugin(counter("count", &hits)).unwrap();
    let base = ServiceDefinition::new("base")
        .field("version", 1)
        .method("ping", |_, _| Ok(json!("pong")))
        .method("version", |ctx, _| Ok(ctx.field("version").cloned().unwrap_or_default()));
    let svc = gears
        .add_service(
            ServiceDefinition::new("derived")
                .namespace("services.derived")
                .field("version", 2)
                .inherit(base),
        )
        .unwrap();

    assert_eq!(svc.call("ping", ()).await.unwrap(), json!("pong"));
    assert_eq!(svc.call("version", ()).await.unwrap(), json!(2));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

// ─── Plugin-scoped scratch ───────────────────────────────────────────────────

#[tokio::test]
async fn test_scratch_is_scoped_to_plugin_and_call() {
    let seen_a = Arc::new(Mutex::new(Vec::new()));
    let seen_b = Arc::new(Mutex::new(Vec::new()));
    let (sink_a, sink_b) = (seen_a.clone(), seen_b.clone());

    let gears = MicroGears::new();
    gears
        .add_plugin(
            Plugin::new("a")
                .before_chain(|args, ctx| {
                    if args.arg::<i64>(0).ok() == Some(1) {
                        ctx.set_state(7u32);
                    }
                    Step::ok(args)
                })
                .after_chain(move |result, ctx| {
                    sink_a.lock().push(ctx.get_state::<u32>());
                    Step::ok(result)
                }),
        )
        .unwrap();
    gears
        .add_plugin(Plugin::new("b").after_chain(move |result, ctx| {
            sink_b.lock().push(ctx.get_state::<u32>());
            Step::ok(result)
        }))
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    svc.call("echo", args![1]).await.unwrap();
    svc.call("echo", args![2]).await.unwrap();
    assert_eq!(*seen_a.lock(), [Some(7), None]);
    assert_eq!(*seen_b.lock(), [None, None]);
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let gears = MicroGears::new();
    gears
        .add_plugin(
            Plugin::new("stash")
                .before_chain(|args, ctx| {
                    ctx.set_state(args.arg::<i64>(0).unwrap_or(-1));
                    Step::ok(args)
                })
                .after_chain(|result, ctx| {
                    let stashed = ctx.take_state::<i64>();
                    Step::ok(json!({ "result": result, "stashed": stashed }))
                }),
        )
        .unwrap();
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .async_method("echo", |_, args| async move {
                    tokio::task::yield_now().await;
                    Ok::<_, BoxError>(args[0].clone())
                }),
        )
        .unwrap();

    let calls = (0..32).map(|i| svc.call("echo", args![i]).into_future());
    let results = futures::future::join_all(calls).await;
    for (i, res) in results.into_iter().enumerate() {
        assert_eq!(res.unwrap(), json!({ "result": i, "stashed": i }));
    }
    assert_eq!(gears.cached_chains(), 1);
}

// ─── Cache invalidation and reset ────────────────────────────────────────────

#[test]
fn test_plugin_changes_invalidate_cached_chains() {
    let gears = MicroGears::new();
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .sync()
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();
    let call = || svc.call("echo", args!["x"]).ready().unwrap().unwrap();

    assert_eq!(gears.cached_chains(), 0);
    assert_eq!(call(), json!("x"));
    assert_eq!(gears.cached_chains(), 1);

    gears
        .add_plugin(Plugin::new("bang").after_chain(|result, _| {
            Step::ok(json!(format!("{}!", result.as_str().unwrap_or_default())))
        }))
        .unwrap();
    assert_eq!(gears.cached_chains(), 0);
    assert_eq!(call(), json!("x!"));

    gears.remove_plugin("bang").unwrap();
    assert_eq!(call(), json!("x"));
}

#[test]
fn test_remove_service_drops_its_chains() {
    let gears = MicroGears::new();
    gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .sync()
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();
    gears.call("echo", "echo", args![1]).ready().unwrap().unwrap();
    assert_eq!(gears.cached_chains(), 1);

    assert!(gears.remove_service("echo").is_some());
    assert_eq!(gears.cached_chains(), 0);
    assert!(gears.remove_service("echo").is_none());
}

#[test]
fn test_stale_handles_are_not_cached() {
    let gears = MicroGears::new();
    let echo = || {
        ServiceDefinition::new("echo")
            .namespace("services.echo")
            .sync()
            .method("echo", |_, args| Ok(args[0].clone()))
    };

    let removed = gears.add_service(echo()).unwrap();
    gears.remove_service("echo").unwrap();
    for _ in 0..3 {
        assert_eq!(removed.call("echo", args![1]).ready().unwrap().unwrap(), json!(1));
    }
    assert_eq!(gears.cached_chains(), 0);

    let before_reset = gears.add_service(echo()).unwrap();
    gears.reset();
    assert_eq!(before_reset.call("echo", args![2]).ready().unwrap().unwrap(), json!(2));
    assert_eq!(gears.cached_chains(), 0);

    gears.add_service(echo()).unwrap();
    gears.call("echo", "echo", args![3]).ready().unwrap().unwrap();
    removed.call("echo", args![4]).ready().unwrap().unwrap();
    assert_eq!(gears.cached_chains(), 1);
}

#[tokio::test]
async fn test_reset_forgets_services_and_plugins() {
    let hits = Arc::new(AtomicUsize::new(0));
    let gears = MicroGears::new();
    gears.add_plugin(counter("count", &hits)).unwrap();
    let old = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();
    old.call("echo", args![1]).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    gears.reset();
    assert!(gears.service("echo").is_none());
    assert!(gears.plugin_names().is_empty());
    assert_eq!(gears.cached_chains(), 0);
    let err = gears.call("echo", "echo", args![1]).await.unwrap_err();
    assert!(matches!(err, InvokeError::UnknownService(name) if name == "echo"));

    old.call("echo", args![1]).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(gears.cached_chains(), 0);

    // names are free again
    gears.add_plugin(counter("count", &hits)).unwrap();
    gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();
    gears.call("echo", "echo", args![1]).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

// ─── Registration errors ─────────────────────────────────────────────────────

#[test]
fn test_plugin_registration_errors() {
    let gears = MicroGears::new();

    assert_eq!(
        gears.add_plugin(Plugin::new("hollow")),
        Err(RegistryError::invalid_plugin("hollow"))
    );
    assert_eq!(
        gears.add_plugin(Plugin::new("").after_chain(|r, _| Step::ok(r))),
        Err(RegistryError::MissingName)
    );

    gears
        .add_plugin(Plugin::new("trace").after_chain(|r, _| Step::ok(r)))
        .unwrap();
    assert_eq!(
        gears.add_plugin(Plugin::new("trace").before_chain(|a, _| Step::ok(a))),
        Err(RegistryError::DuplicateName("trace".into()))
    );
    assert_eq!(
        gears.remove_plugin("ghost"),
        Err(RegistryError::UnknownPlugin("ghost".into()))
    );
    assert_eq!(gears.plugin_names(), ["trace"]);
}

#[test]
fn test_service_registration_errors() {
    let gears = MicroGears::new();

    assert_eq!(
        gears.add_service(ServiceDefinition::new("")).unwrap_err(),
        RegistryError::MissingServiceName
    );
    assert_eq!(
        gears.add_service(ServiceDefinition::new("users")).unwrap_err(),
        RegistryError::missing_namespace("users")
    );

    gears
        .add_service(ServiceDefinition::new("users").namespace("services.users"))
        .unwrap();
    assert_eq!(
        gears
            .add_service(ServiceDefinition::new("users").namespace("services.other"))
            .unwrap_err(),
        RegistryError::DuplicateServiceName("users".into())
    );
    assert_eq!(gears.service_names(), ["users"]);
    assert_eq!(gears.service("users").unwrap().namespace(), "services.users");
}

#[tokio::test]
async fn test_unknown_service_and_method() {
    let gears = MicroGears::new();
    let err = gears.call("nobody", "nothing", ()).await.unwrap_err();
    assert_eq!(err.to_string(), "service 'nobody' is not registered");

    gears
        .add_service(ServiceDefinition::new("users").namespace("services.users"))
        .unwrap();
    let err = gears.call("users", "nothing", ()).await.unwrap_err();
    assert!(matches!(err, InvokeError::UnknownMethod { .. }));
}

// ─── Descriptors and built-ins ───────────────────────────────────────────────

fn shout(result: Value, _ctx: &crate::context::HookContext) -> Step<Value> {
    Step::ok(json!(result.as_str().unwrap_or_default().to_uppercase()))
}

static SHOUT: crate::plugin::PluginDescriptor = crate::define_plugin! {
    name: "shout",
    after_chain: shout,
};

#[tokio::test]
async fn test_descriptor_registration() {
    let gears = MicroGears::new();
    gears.add_plugin(SHOUT).unwrap();
    assert_eq!(gears.add_plugin(&SHOUT), Err(RegistryError::DuplicateName("shout".into())));
    let svc = gears
        .add_service(
            ServiceDefinition::new("echo")
                .namespace("services.echo")
                .method("echo", |_, args| Ok(args[0].clone())),
        )
        .unwrap();

    assert_eq!(svc.call("echo", args!["quiet"]).await.unwrap(), json!("QUIET"));
}

#[cfg(feature = "builtin-plugins")]
#[tokio::test]
async fn test_builtin_plugins_leave_results_untouched() {
    use std::time::Duration;

    use crate::plugin::builtin::{TRACE_PLUGIN, performance_plugin};

    let gears = MicroGears::new();
    gears.add_plugin(TRACE_PLUGIN).unwrap();
    gears.add_plugin(performance_plugin(Duration::ZERO)).unwrap();
    assert_eq!(gears.plugin_names(), ["tracePlugin", "performancePlugin"]);

    let users = gears
        .add_service(
            failing_users().method("findUserByName", |_, args| {
                Ok(json!({ "name": args.arg::<String>(0)?, "id": 1 }))
            }),
        )
        .unwrap();

    let user = users.call("findUserByName", args!["clark"]).await.unwrap();
    assert_eq!(user, json!({ "name": "clark", "id": 1 }));
    let err = users.call("findUserById", args![2]).await.unwrap_err();
    assert!(err.is::<NotFound>());
}
