use clap::{Parser, Subcommand, ValueEnum};
use form_rules::{
    Condition, EdgeKind, Field, PageGraph, PageId, RenderState, ValidationResult, check_all,
    check_condition, conditions_schema, evaluate, fields_schema, page_graph, validate,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional rules toolkit for multi-page forms",
    long_about = "Checks rule files for contradictions, evaluates render state against live values, and derives the page navigation graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GraphFormat {
    Text,
    Json,
    Dot,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    Conditions,
    Fields,
}

#[derive(Subcommand)]
enum Command {
    /// Check a rule set (or one candidate rule) for contradictions.
    Check {
        /// Path to the field definitions JSON array.
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        /// Path to the accepted conditions JSON array.
        #[arg(long, value_name = "CONDITIONS")]
        conditions: PathBuf,
        /// Optional single candidate condition to check against the accepted set.
        #[arg(long, value_name = "CANDIDATE")]
        candidate: Option<PathBuf>,
    },
    /// Compute the effective render state for a set of live values.
    Eval {
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        #[arg(long, value_name = "CONDITIONS")]
        conditions: PathBuf,
        /// Path to the current field values JSON object.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        /// Active page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate submitted values against the effective render state.
    Validate {
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        #[arg(long, value_name = "CONDITIONS")]
        conditions: PathBuf,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Derive the page navigation graph.
    Pages {
        #[arg(long, value_name = "FIELDS")]
        fields: PathBuf,
        #[arg(long, value_name = "CONDITIONS")]
        conditions: PathBuf,
        #[arg(long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },
    /// Print the JSON Schema for the persisted documents.
    Schema {
        #[arg(long, value_enum, default_value_t = SchemaKind::Conditions)]
        kind: SchemaKind,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            fields,
            conditions,
            candidate,
        } => run_check(fields, conditions, candidate),
        Command::Eval {
            fields,
            conditions,
            values,
            page,
            format,
        } => run_eval(fields, conditions, values, page, format),
        Command::Validate {
            fields,
            conditions,
            values,
            page,
        } => run_validate(fields, conditions, values, page),
        Command::Pages {
            fields,
            conditions,
            format,
        } => run_pages(fields, conditions, format),
        Command::Schema { kind } => run_schema(kind),
    }
}

fn load_fields(path: &PathBuf) -> CliResult<Vec<Field>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_conditions(path: &PathBuf) -> CliResult<Vec<Condition>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_values(path: &PathBuf) -> CliResult<Value> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn run_check(
    fields_path: PathBuf,
    conditions_path: PathBuf,
    candidate_path: Option<PathBuf>,
) -> CliResult<()> {
    let fields = load_fields(&fields_path)?;
    let conditions = load_conditions(&conditions_path)?;

    if let Some(path) = candidate_path {
        let contents = fs::read_to_string(&path)?;
        let candidate: Condition = serde_json::from_str(&contents)?;
        return match check_condition(&candidate, &conditions, &fields) {
            Ok(()) => {
                println!("Candidate '{}' is accepted.", candidate.id);
                Ok(())
            }
            Err(error) => {
                eprintln!("Candidate '{}' rejected: {}", candidate.id, error);
                Err("contradiction detected".into())
            }
        };
    }

    let rejected = check_all(&conditions, &fields);
    if rejected.is_empty() {
        println!("All {} condition(s) are consistent.", conditions.len());
        Ok(())
    } else {
        for (index, error) in &rejected {
            eprintln!("Condition '{}' (#{}): {}", conditions[*index].id, index, error);
        }
        Err(format!("{} condition(s) rejected", rejected.len()).into())
    }
}

fn run_eval(
    fields_path: PathBuf,
    conditions_path: PathBuf,
    values_path: PathBuf,
    page: u32,
    format: OutputFormat,
) -> CliResult<()> {
    let fields = load_fields(&fields_path)?;
    let conditions = load_conditions(&conditions_path)?;
    let values = load_values(&values_path)?;
    let state = evaluate(&fields, &conditions, &values, PageId::new(page));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Text => print!("{}", render_state_text(&state)),
    }
    Ok(())
}

fn render_state_text(state: &RenderState) -> String {
    let mut lines = Vec::new();
    lines.push("Fields:".to_string());
    for (key, field) in &state.fields {
        let mut entry = format!(
            " - {}: {}{}{}",
            key,
            if field.visible { "visible" } else { "hidden" },
            if field.required { ", required" } else { "" },
            if field.enabled { "" } else { ", disabled" },
        );
        if let Some(mask) = &field.mask {
            entry.push_str(&format!(", mask {}", mask));
        }
        if !field.options.is_empty() {
            entry.push_str(&format!(", options [{}]", field.options.join(", ")));
        }
        lines.push(entry);
    }
    match &state.navigation.skip_to {
        Some(target) => lines.push(format!("Skip to: {}", target)),
        None => lines.push("Skip to: none".to_string()),
    }
    if state.navigation.hidden_pages.is_empty() {
        lines.push("Hidden pages: none".to_string());
    } else {
        let hidden: Vec<String> = state
            .navigation
            .hidden_pages
            .iter()
            .map(ToString::to_string)
            .collect();
        lines.push(format!("Hidden pages: {}", hidden.join(", ")));
    }
    lines.join("\n") + "\n"
}

fn run_validate(
    fields_path: PathBuf,
    conditions_path: PathBuf,
    values_path: PathBuf,
    page: u32,
) -> CliResult<()> {
    let fields = load_fields(&fields_path)?;
    let conditions = load_conditions(&conditions_path)?;
    let values = load_values(&values_path)?;

    let result = validate(&fields, &conditions, &values, PageId::new(page));
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.field, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_pages(fields_path: PathBuf, conditions_path: PathBuf, format: GraphFormat) -> CliResult<()> {
    let fields = load_fields(&fields_path)?;
    let conditions = load_conditions(&conditions_path)?;
    let graph = page_graph(&fields, &conditions);

    match format {
        GraphFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
        GraphFormat::Dot => print!("{}", render_dot(&graph)),
        GraphFormat::Text => print!("{}", render_graph_text(&graph)),
    }
    Ok(())
}

fn render_graph_text(graph: &PageGraph) -> String {
    let mut lines = Vec::new();
    lines.push("Pages:".to_string());
    for node in &graph.nodes {
        lines.push(format!(" - {} ({} field(s))", node.id, node.field_count));
    }
    lines.push("Transitions:".to_string());
    for edge in &graph.edges {
        let label = match edge.kind {
            EdgeKind::Next => "next".to_string(),
            EdgeKind::SkipTo => format!(
                "skip to [{}]",
                edge.condition_id.as_deref().unwrap_or("<unknown>")
            ),
            EdgeKind::Hide => format!(
                "hide [{}]",
                edge.condition_id.as_deref().unwrap_or("<unknown>")
            ),
        };
        lines.push(format!(" - {} -> {} ({})", edge.from, edge.to, label));
    }
    lines.join("\n") + "\n"
}

fn render_dot(graph: &PageGraph) -> String {
    let mut lines = Vec::new();
    lines.push("digraph pages {".to_string());
    lines.push("  rankdir=LR;".to_string());
    for node in &graph.nodes {
        lines.push(format!("  \"{}\" [shape=box];", node.id));
    }
    for edge in &graph.edges {
        let attrs = match (edge.kind, edge.condition_id.as_deref()) {
            (EdgeKind::Next, _) => String::new(),
            (EdgeKind::SkipTo, id) => format!(
                " [label=\"skip to ({})\", style=dashed]",
                id.unwrap_or("?")
            ),
            (EdgeKind::Hide, id) => {
                format!(" [label=\"hide ({})\", style=dotted]", id.unwrap_or("?"))
            }
        };
        lines.push(format!("  \"{}\" -> \"{}\"{};", edge.from, edge.to, attrs));
    }
    lines.push("}".to_string());
    lines.join("\n") + "\n"
}

fn run_schema(kind: SchemaKind) -> CliResult<()> {
    let schema = match kind {
        SchemaKind::Conditions => conditions_schema(),
        SchemaKind::Fields => fields_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_fixture(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).expect("encode"))
            .expect("write fixture");
        path
    }

    fn sample_fields() -> Value {
        json!([
            { "key": "F1", "type": "radio", "page": 1,
              "properties": { "options": ["Yes", "No"] } },
            { "key": "F2", "type": "shorttext", "page": 1, "properties": {} },
            { "key": "F3", "type": "number", "page": 2, "properties": {} }
        ])
    }

    #[test]
    fn check_accepts_consistent_rules() {
        let dir = TempDir::new().expect("temp dir");
        let fields = write_fixture(dir.path(), "fields.json", &sample_fields());
        let conditions = write_fixture(
            dir.path(),
            "conditions.json",
            &json!([
                { "id": "c1", "type": "show_hide", "ifField": "F1", "operator": "equals",
                  "value": "Yes", "thenAction": "show", "thenFields": ["F2"] }
            ]),
        );

        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        let assert = cmd
            .arg("check")
            .arg("--fields")
            .arg(&fields)
            .arg("--conditions")
            .arg(&conditions)
            .assert()
            .success();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
        assert!(stdout.contains("consistent"));
    }

    #[test]
    fn check_rejects_contradictory_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let fields = write_fixture(dir.path(), "fields.json", &sample_fields());
        let conditions = write_fixture(
            dir.path(),
            "conditions.json",
            &json!([
                { "id": "c1", "type": "show_hide", "ifField": "F1", "operator": "equals",
                  "value": "Yes", "thenAction": "show", "thenFields": ["F2"] }
            ]),
        );
        let candidate = write_fixture(
            dir.path(),
            "candidate.json",
            &json!({ "id": "local_1", "type": "show_hide", "ifField": "F1",
                     "operator": "equals", "value": "Yes", "thenAction": "hide",
                     "thenFields": ["F2"] }),
        );

        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        cmd.arg("check")
            .arg("--fields")
            .arg(&fields)
            .arg("--conditions")
            .arg(&conditions)
            .arg("--candidate")
            .arg(&candidate)
            .assert()
            .failure();
    }

    #[test]
    fn eval_emits_json_render_state() {
        let dir = TempDir::new().expect("temp dir");
        let fields = write_fixture(dir.path(), "fields.json", &sample_fields());
        let conditions = write_fixture(
            dir.path(),
            "conditions.json",
            &json!([
                { "id": "c1", "type": "show_hide", "ifField": "F1", "operator": "equals",
                  "value": "No", "thenAction": "hide", "thenFields": ["F2"] }
            ]),
        );
        let values = write_fixture(dir.path(), "values.json", &json!({ "F1": "No" }));

        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        let assert = cmd
            .arg("eval")
            .arg("--fields")
            .arg(&fields)
            .arg("--conditions")
            .arg(&conditions)
            .arg("--values")
            .arg(&values)
            .arg("--format")
            .arg("json")
            .assert()
            .success();
        let output: Value =
            serde_json::from_slice(&assert.get_output().stdout).expect("json output");
        assert_eq!(output["fields"]["F2"]["visible"], false);
    }

    #[test]
    fn validate_fails_on_missing_required_answer() {
        let dir = TempDir::new().expect("temp dir");
        let fields = write_fixture(dir.path(), "fields.json", &sample_fields());
        let conditions = write_fixture(
            dir.path(),
            "conditions.json",
            &json!([
                { "id": "c1", "type": "enable_require_mask", "ifField": "F1",
                  "operator": "equals", "value": "Yes", "thenAction": "require",
                  "thenFields": ["F2"] }
            ]),
        );
        let values = write_fixture(dir.path(), "values.json", &json!({ "F1": "Yes" }));

        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        let assert = cmd
            .arg("validate")
            .arg("--fields")
            .arg(&fields)
            .arg("--conditions")
            .arg(&conditions)
            .arg("--values")
            .arg(&values)
            .assert()
            .failure();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
        assert!(stdout.contains("F2"));
    }

    #[test]
    fn pages_dot_output_names_every_page() {
        let dir = assert_fs::TempDir::new().expect("temp dir");
        let fields = write_fixture(dir.path(), "fields.json", &sample_fields());
        let conditions = write_fixture(dir.path(), "conditions.json", &json!([]));

        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        let assert = cmd
            .arg("pages")
            .arg("--fields")
            .arg(&fields)
            .arg("--conditions")
            .arg(&conditions)
            .arg("--format")
            .arg("dot")
            .assert()
            .success();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
        assert!(stdout.contains("digraph pages"));
        assert!(stdout.contains("\"page_1\" -> \"page_2\""));
    }

    #[test]
    fn schema_subcommand_prints_json() {
        let mut cmd = Command::cargo_bin("form-rules").expect("binary");
        let assert = cmd.arg("schema").arg("--kind").arg("fields").assert().success();
        let output: Value =
            serde_json::from_slice(&assert.get_output().stdout).expect("schema json");
        assert_eq!(output["type"], "array");
    }
}
