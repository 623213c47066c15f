use colored::Colorize;
use perfiladv_core::region::STATES;
use perfiladv_core::schema::{Matcher, SubstringRule, SUBSTRING_RULES, SYNONYMS};
use serde_json::json;

use crate::prelude::{println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct TablesOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(options: TablesOptions, _global: crate::Global) -> Result<()> {
    if options.json {
        println!("{}", serde_json::to_string_pretty(&tables_json())?);
        return Ok(());
    }

    println!("{}", "Estados".bright_white().bold());
    let mut states = new_table();
    states.add_row(prettytable::row![b->"UF", b->"Estado", b->"Região"]);
    for state in &STATES {
        states.add_row(prettytable::row![state.code, state.name, state.region]);
    }
    states.printstd();

    println!("\n{}", "Sinônimos de colunas".bright_white().bold());
    let mut synonyms = new_table();
    synonyms.add_row(prettytable::row![b->"Cabeçalho", b->"Coluna"]);
    for (token, attribute) in SYNONYMS {
        synonyms.add_row(prettytable::row![token, attribute.key()]);
    }
    synonyms.printstd();

    println!("\n{}", "Regras por substring (em ordem)".bright_white().bold());
    let mut rules = new_table();
    rules.add_row(prettytable::row![b->"Coluna", b->"Quando", b->"Exceto"]);
    for rule in SUBSTRING_RULES {
        rules.add_row(prettytable::row![
            rule.attribute.key(),
            describe_matchers(rule),
            rule.unless.join(", ")
        ]);
    }
    rules.printstd();

    Ok(())
}

fn describe_matcher(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Contains(text) => format!("contains '{text}'"),
        Matcher::Segment(text) => format!("segment '{text}'"),
        Matcher::All(texts) => format!(
            "contains all of {}",
            texts
                .iter()
                .map(|t| format!("'{t}'"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn describe_matchers(rule: &SubstringRule) -> String {
    rule.any
        .iter()
        .map(describe_matcher)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn tables_json() -> serde_json::Value {
    json!({
        "states": STATES,
        "synonyms": SYNONYMS
            .iter()
            .map(|(token, attribute)| json!({ "header": token, "column": attribute.key() }))
            .collect::<Vec<_>>(),
        "substring_rules": SUBSTRING_RULES
            .iter()
            .map(|rule| json!({
                "column": rule.attribute.key(),
                "when": rule.any.iter().map(describe_matcher).collect::<Vec<_>>(),
                "unless": rule.unless,
            }))
            .collect::<Vec<_>>(),
    })
}
