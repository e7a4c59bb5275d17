use std::convert::Infallible;

use anyhow::{Context, Result};
use clap::Parser;
use rollbook_store::{with_store, DatabaseConfig, SqlParam};

use crate::output;

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// SQL statement; use $1, $2, ... for parameters
    pub sql: String,

    /// Positional parameter value (repeatable). Integers, YYYY-MM-DD dates,
    /// true/false and null are typed; anything else is text.
    #[arg(long = "param", short = 'p', value_name = "VALUE", value_parser = parse_param)]
    pub params: Vec<SqlParam>,

    /// Print rows as a JSON array of objects
    #[arg(long)]
    pub json: bool,
}

// clap would otherwise pick `From<String>` and bind everything as text
fn parse_param(value: &str) -> std::result::Result<SqlParam, Infallible> {
    value.parse()
}

pub async fn run_query(config: DatabaseConfig, args: QueryArgs) -> Result<()> {
    let QueryArgs { sql, params, json } = args;

    let set = with_store(config, |store| {
        Box::pin(async move {
            store
                .run(&sql, &params)
                .await
                .context("Failed to run query")
        })
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&set.to_objects())?);
    } else {
        print!("{}", output::result_table(&set));
    }
    Ok(())
}
