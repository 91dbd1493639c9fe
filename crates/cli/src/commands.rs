use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the statements a grid request would run, without a database
    Plan {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, default_value = "postgres", help = "SQL dialect: postgres or mysql")]
        dialect: String,
    },
    /// Print the initial grid configuration of a table
    Describe {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Run a grid request against Postgres and print the response
    Fetch {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, help = "Postgres connection URL")]
        url: String,
    },
}

#[derive(Args)]
pub struct TableArgs {
    #[arg(long, help = "Table definition file (JSON)")]
    pub table: String,

    #[arg(long, help = "Entity metadata file (JSON)")]
    pub metadata: String,

    #[arg(long, help = "Factory defaults file (JSON)")]
    pub config: Option<String>,
}

#[derive(Args)]
pub struct RequestArgs {
    #[arg(long, help = "Request parameters file (JSON)")]
    pub request: Option<String>,

    /// Form-style request parameter, e.g. `columns[0][search][value]=foo`
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    #[arg(long, help = "Treat the request as the first draw of the page")]
    pub init: bool,
}
