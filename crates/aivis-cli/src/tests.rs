use super::*;
use std::io::Write as _;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["aivis-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["aivis-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn process_requires_at_least_one_file() {
    assert!(Cli::try_parse_from(["aivis-cli", "process"]).is_err());
}

#[test]
fn parses_process_with_files_and_dry_run() {
    let cli = Cli::try_parse_from(["aivis-cli", "process", "a.json", "b.json", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Process {
            ref files,
            concurrency: None,
            dry_run: true,
        }) if files.len() == 2
    ));
}

#[test]
fn parses_process_concurrency_override() {
    let cli = Cli::try_parse_from(["aivis-cli", "process", "a.json", "--concurrency", "16"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Process {
            concurrency: Some(16),
            dry_run: false,
            ..
        })
    ));
}

#[test]
fn repair_limit_defaults_to_500() {
    let cli = Cli::try_parse_from(["aivis-cli", "repair"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Repair { limit: 500 })));
}

#[test]
fn parses_brands_list_with_limit() {
    let cli = Cli::try_parse_from(["aivis-cli", "brands", "list", "--limit", "5"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Brands {
            command: BrandsCommands::List { limit: 5 }
        })
    ));
}

#[test]
fn parses_brands_show() {
    let cli = Cli::try_parse_from(["aivis-cli", "brands", "show", "high rise"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Brands {
            command: BrandsCommands::Show { ref slug }
        }) if slug == "high rise"
    ));
}

#[test]
fn parses_brands_add_website() {
    let cli = Cli::try_parse_from(["aivis-cli", "brands", "add-website", "acme", "acme.io"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Brands {
            command: BrandsCommands::AddWebsite { ref slug, ref domain }
        }) if slug == "acme" && domain == "acme.io"
    ));
}

const ANSWER_JSON: &str = r#"{
    "result_id": "5f0c6a1e-52a4-4d5c-9a43-2b0c7b9c1d10",
    "website_id": "0e6a3c55-7f5b-4d8e-8f43-6a5d9d1c2b33",
    "engine": "chatgpt",
    "tags": ["general"],
    "metadata": { "date": "2026-10-01", "model": "gpt-4o" },
    "citations": [{ "url": "https://acme.com/pricing" }],
    "mentions": [{ "name": "Acme", "ranking_position": 1, "sentiment": 80 }]
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn answer_files_accept_a_single_answer_or_an_array() {
    let single = write_temp(ANSWER_JSON);
    let many = write_temp(&format!("[{ANSWER_JSON}, {ANSWER_JSON}]"));

    let answers = process::load_answers(&[single.path().to_path_buf(), many.path().to_path_buf()])
        .expect("answers should load");

    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0].engine, "chatgpt");
    assert_eq!(answers[0].mentions[0].ranking_position, Some(1));
}

#[test]
fn malformed_answer_file_names_the_path() {
    let bad = write_temp("{ not json");
    let err = process::load_answers(&[bad.path().to_path_buf()]).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}

#[test]
fn missing_answer_file_is_an_error() {
    let err = process::load_answers(&[PathBuf::from("/nonexistent/answers.json")]).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn sample_answers_reference_tracked_websites() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let tracked = aivis_core::load_tracked_websites(&root.join("config/tracked.yaml"))
        .expect("tracked config should load");
    let answers = process::load_answers(&[root.join("config/sample_answers.json")])
        .expect("sample answers should load");

    assert!(!answers.is_empty());
    for answer in &answers {
        assert!(tracked.find(answer.website_id).is_some());
    }
}
