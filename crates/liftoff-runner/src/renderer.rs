use ascii_tree::{write_tree, Tree};
use liftoff_types::{CommandReport, HostOutcome, RunReport};

/// Renders a `RunReport` as an ASCII tree.
///
/// One node per queued command in execution order, with one child per
/// host the command ran on.
pub fn render_run_report_as_tree(report: &RunReport) -> Result<String, std::fmt::Error> {
    let status_icon = if report.succeeded() { "✅" } else { "❌" };
    let mut root_label = format!(
        "{} {} -> {} ({} commands, {} connections)",
        status_icon,
        report.mission,
        report.target,
        report.commands.len(),
        report.connections
    );
    if let Some(duration) = report.duration_ms() {
        root_label.push_str(&format!(" in {duration}ms"));
    }

    let mut nodes: Vec<Tree> = report.commands.iter().map(render_command_node).collect();
    if let Some(error) = &report.teardown_error {
        nodes.push(Tree::Leaf(vec![format!("⚠️ Teardown failed: {error}")]));
    }

    let tree = Tree::Node(root_label, nodes);
    let mut buffer = String::new();
    write_tree(&mut buffer, &tree)?;
    Ok(buffer)
}

fn render_command_node(command: &CommandReport) -> Tree {
    let icon = if command.succeeded() { "✅" } else { "❌" };
    let label = format!(
        "{} [{}] {}: {}",
        icon,
        command.index + 1,
        command.kind,
        command.command
    );
    Tree::Node(label, command.outcomes.iter().map(render_outcome_node).collect())
}

fn render_outcome_node(outcome: &HostOutcome) -> Tree {
    let status = match (&outcome.error, outcome.success) {
        (_, true) => "ok".to_string(),
        (Some(error), false) => error.clone(),
        (None, false) => "failed".to_string(),
    };
    let label = format!("{} ({}ms): {}", outcome.host, outcome.duration_ms, status);

    let mut lines = Vec::new();
    for line in outcome.stdout.lines().filter(|l| !l.trim().is_empty()) {
        lines.push(format!("  {line}"));
    }
    if !outcome.success {
        for line in outcome.stderr.lines().filter(|l| !l.trim().is_empty()) {
            lines.push(format!("! {line}"));
        }
    }

    if lines.is_empty() {
        Tree::Leaf(vec![label])
    } else {
        Tree::Node(label, vec![Tree::Leaf(lines)])
    }
}
