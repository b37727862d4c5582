//! Command composition and scope handling on the mission context

use liftoff_orchestrator::{CommandKind, MissionContext, QueuedCommand};
use rstest::rstest;

fn texts(ctx: &MissionContext) -> Vec<&str> {
    ctx.queued().iter().map(QueuedCommand::text).collect()
}

#[test]
fn test_nested_scopes_compose_outermost_first() {
    let mut ctx = MissionContext::new("web");

    ctx.with_scope("a", |ctx| {
        ctx.with_scope("b", |ctx| {
            ctx.remote("c");
        });
    });
    ctx.remote("c");

    assert_eq!(texts(&ctx), vec!["a && b && c", "c"]);
    assert_eq!(ctx.scope_depth(), 0);
}

#[test]
fn test_queue_preserves_insertion_order_and_kind() {
    let mut ctx = MissionContext::new("web");
    ctx.local("make dist");
    ctx.remote("tar xf dist.tar");
    ctx.local("echo shipped");

    let kinds: Vec<CommandKind> = ctx.queued().iter().map(QueuedCommand::kind).collect();
    assert_eq!(
        kinds,
        vec![CommandKind::Local, CommandKind::Remote, CommandKind::Local]
    );
    assert_eq!(texts(&ctx), vec!["make dist", "tar xf dist.tar", "echo shipped"]);
}

#[test]
fn test_local_commands_are_scoped_too() {
    let mut ctx = MissionContext::new("local");
    ctx.with_scope("cd /tmp", |ctx| ctx.local("ls"));

    assert_eq!(ctx.queued()[0], QueuedCommand::local("cd /tmp && ls"));
}

#[test]
fn test_queued_text_is_fixed_at_queue_time() {
    let mut ctx = MissionContext::new("web");
    {
        let mut outer = ctx.scope("cd /srv");
        outer.remote("ls");
        {
            let mut inner = outer.scope("source .env");
            inner.remote("make");
        }
        outer.remote("pwd");
    }

    assert_eq!(
        texts(&ctx),
        vec!["cd /srv && ls", "cd /srv && source .env && make", "cd /srv && pwd"]
    );
}

#[test]
fn test_scope_is_popped_when_callback_returns_error() {
    let mut ctx = MissionContext::new("web");

    let result = ctx.with_scope("cd /app", |ctx| -> anyhow::Result<()> {
        ctx.remote("step one");
        ctx.with_scope("sudo -v", |ctx| -> anyhow::Result<()> {
            ctx.remote("step two");
            anyhow::bail!("stop here")
        })?;
        ctx.remote("never queued");
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(ctx.scope_depth(), 0);
    ctx.remote("after");
    assert_eq!(
        texts(&ctx),
        vec!["cd /app && step one", "cd /app && sudo -v && step two", "after"]
    );
}

#[test]
fn test_with_scope_returns_callback_value() {
    let mut ctx = MissionContext::new("web");
    let depth = ctx.with_scope("x", |ctx| ctx.with_scope("y", |ctx| ctx.scope_depth()));
    assert_eq!(depth, 2);
}

#[test]
fn test_context_exposes_target() {
    let ctx = MissionContext::new("staging");
    assert_eq!(ctx.target(), "staging");
    assert!(ctx.queued().is_empty());
}

#[rstest]
#[case(&[], "uptime", "uptime")]
#[case(&["cd /app"], "make", "cd /app && make")]
#[case(&["cd /app", "export RUST_LOG=info"], "./serve", "cd /app && export RUST_LOG=info && ./serve")]
fn test_compose(#[case] scopes: &[&str], #[case] cmd: &str, #[case] expected: &str) {
    fn compose_in(ctx: &mut MissionContext, scopes: &[&str], cmd: &str) -> String {
        match scopes.split_first() {
            None => ctx.compose(cmd),
            Some((first, rest)) => ctx.with_scope(*first, |ctx| compose_in(ctx, rest, cmd)),
        }
    }

    let mut ctx = MissionContext::new("web");
    assert_eq!(compose_in(&mut ctx, scopes, cmd), expected);
    assert_eq!(ctx.scope_depth(), 0);
}
