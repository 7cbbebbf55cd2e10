use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of a CSV file as JSON lines
    Page {
        #[arg(long, help = "CSV file path")]
        file: String,

        #[arg(long, help = "Ordering, e.g. \"created_at:desc,id:desc:distinct\"")]
        order: String,

        #[arg(long, help = "Rows per page; clamped to the configured maximum")]
        per_page: Option<i64>,

        #[arg(long, help = "Cursor token returned by a previous page")]
        cursor: Option<String>,

        #[arg(
            long,
            help = "Start from the first page when the cursor token is unusable"
        )]
        fallback_first_page: bool,
    },
    /// Walk every page of a CSV file and print a summary
    Scan {
        #[arg(long, help = "CSV file path")]
        file: String,

        #[arg(long, help = "Ordering, e.g. \"created_at:desc,id:desc:distinct\"")]
        order: String,

        #[arg(long, help = "Rows per page; clamped to the configured maximum")]
        per_page: Option<i64>,
    },
    /// Print the SQL that fetches one page of a table
    Sql {
        #[arg(long, help = "Table name, optionally schema-qualified")]
        table: String,

        #[arg(long, help = "Ordering, e.g. \"created_at:desc,id:desc:distinct\"")]
        order: String,

        #[arg(long, help = "Rows per page; clamped to the configured maximum")]
        per_page: Option<i64>,

        #[arg(long, help = "Cursor token returned by a previous page")]
        cursor: Option<String>,

        /// SQL dialect: "postgres" or "mysql"
        #[arg(long, default_value = "postgres")]
        dialect: String,
    },
}
