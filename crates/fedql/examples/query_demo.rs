/// Example running statements against an in-memory "devops" source
use fedql::logging::LogConfig;
use fedql::source::row;
use fedql::{MemorySource, QueryEngine, QueryResult};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = LogConfig::from_env().compact().init();

    println!("fedql Query Demo");
    println!("================\n");

    let engine = QueryEngine::new();
    engine.register_source(
        "devops",
        MemorySource::new()
            .with_table(
                "projects",
                ["name", "url"],
                vec![
                    row([("name", "website"), ("url", "https://dev.example.com/website")]),
                    row([("name", "api"), ("url", "https://dev.example.com/api")]),
                    row([("name", "infra"), ("url", "https://dev.example.com/infra")]),
                ],
            )
            .with_table(
                "pipelines",
                ["id", "project", "folder", "name"],
                vec![
                    row([("id", "1"), ("project", "website"), ("folder", "\\"), ("name", "ci")]),
                    row([("id", "2"), ("project", "api"), ("folder", "\\"), ("name", "ci")]),
                    row([("id", "3"), ("project", "api"), ("folder", "\\release"), ("name", "deploy")]),
                    row([("id", "4"), ("project", "infra"), ("folder", "\\"), ("name", "plan")]),
                ],
            )
            .require_equality("pipelines", "project"),
    )?;

    let statements = [
        "SELECT * FROM devops.projects",
        "SELECT name FROM devops.projects WHERE name LIKE 'WEB%' OR name = 'infra'",
        "SELECT id, name FROM devops.pipelines WHERE project = 'api' AND (folder LIKE '%release' OR name = 'ci')",
        "SELECT name FROM devops.pipelines WHERE project = 'api' LIMIT 1",
        "SELECT * FROM devops.pipelines",
        "SELECT * FROM devops.projects WHERE name IN ('api')",
    ];

    for (i, sql) in statements.iter().enumerate() {
        println!("{}. SQL: {}\n", i + 1, sql);
        match engine.query(sql) {
            Ok(result) => print_results(&result),
            Err(e) => println!("   error: {}", e),
        }
        println!();
    }

    Ok(())
}

fn print_results(result: &QueryResult) {
    println!("   {}", result.columns.join(" | "));
    for row in &result.results {
        let values: Vec<&str> = result
            .columns
            .iter()
            .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
            .collect();
        println!("   {}", values.join(" | "));
    }
    println!("   ({} rows)", result.len());
}
