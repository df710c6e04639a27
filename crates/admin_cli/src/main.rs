use std::{error::Error, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{
    CategoryTree, Engine, Expense, ExpenseFilter, ExpenseFilterInput, MoneyCents, NewExpense,
    SpendingChart,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "expensa_admin")]
#[command(about = "Admin utilities for Expensa (categories, expenses, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expensa.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Category(Category),
    Expense(ExpenseCmd),
    /// Print spending per category over a date range.
    Report(ReportArgs),
    /// Write the expenses matching a query as CSV.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    /// Print every root with its children.
    Tree,
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
    /// Id of the root category to attach to.
    #[arg(long)]
    parent: Option<i32>,
}

#[derive(Args, Debug)]
struct ExpenseCmd {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    category: i32,
    /// Unit price as a decimal, e.g. `12.50`.
    #[arg(long)]
    price: MoneyCents,
    #[arg(long, default_value_t = 1)]
    count: i32,
    /// Date as `YYYY-MM-DD`.
    #[arg(long)]
    date: chrono::NaiveDate,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    from: chrono::NaiveDate,
    #[arg(long)]
    to: chrono::NaiveDate,
    /// Break down a single category instead of summing every root.
    #[arg(long)]
    category: Option<i32>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    price_from: Option<String>,
    #[arg(long)]
    price_to: Option<String>,
    #[arg(long)]
    note: Option<String>,
    #[arg(long, default_value = "localDate")]
    sort_by: String,
    /// Output file; stdout when missing.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: i64,
    local_date: String,
    category: &'a str,
    count: i32,
    unit_price: String,
    total_price: String,
    note: Option<&'a str>,
}

fn write_csv<W: Write>(
    out: W,
    tree: &CategoryTree,
    expenses: &[Expense],
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut writer = csv::Writer::from_writer(out);
    for expense in expenses {
        let category = tree
            .get(expense.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("");
        writer.serialize(ExportRow {
            id: expense.id,
            local_date: expense.local_date.to_string(),
            category,
            count: expense.count(),
            unit_price: expense.unit_price().to_string(),
            total_price: expense.total_price().to_string(),
            note: expense.note.as_deref(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn print_tree(tree: &CategoryTree) {
    for root in tree.roots() {
        println!("{} [{}]", root.name, root.id);
        let mut children: Vec<_> = tree.children(root.id).collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in children {
            println!("  {} [{}]", child.name, child.id);
        }
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let category = engine.create_category(&args.name, args.parent).await?;
            println!("created category: {} ({})", category.name, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::Tree,
        }) => {
            print_tree(&engine.category_tree().await?);
        }
        Command::Expense(ExpenseCmd {
            command: ExpenseCommand::Add(args),
        }) => {
            let expense = engine
                .add_expense(NewExpense {
                    category_id: args.category,
                    count: args.count,
                    unit_price: args.price,
                    local_date: args.date,
                    note: args.note,
                })
                .await?;
            println!(
                "created expense: {} (total {})",
                expense.id,
                expense.total_price()
            );
        }
        Command::Report(args) => {
            match engine
                .spending_chart(args.category, args.from, args.to)
                .await?
            {
                SpendingChart::Breakdown(breakdown) => {
                    println!("(no subcategory)\t{}", breakdown.no_subcategory);
                    for (name, total) in &breakdown.subcategories {
                        println!("{name}\t{total}");
                    }
                    println!("total\t{}", breakdown.total()?);
                }
                SpendingChart::Parents(totals) => {
                    for (name, total) in &totals {
                        println!("{name}\t{total}");
                    }
                    let total = MoneyCents::checked_sum(totals.values().copied())
                        .ok_or("report total overflow")?;
                    println!("total\t{total}");
                }
            }
        }
        Command::Export(args) => {
            let filter = ExpenseFilter::try_from(ExpenseFilterInput {
                start_date: args.from,
                finish_date: args.to,
                category_id: args.category,
                price_from: args.price_from,
                price_to: args.price_to,
                note: args.note,
                sort_by: args.sort_by,
            })?;
            let (expenses, tree) = engine.query_expenses_with_categories(&filter).await?;
            match args.output {
                Some(path) => write_csv(std::fs::File::create(&path)?, &tree, &expenses)?,
                None => write_csv(std::io::stdout().lock(), &tree, &expenses)?,
            }
            eprintln!("exported {} expense(s)", expenses.len());
        }
    }

    Ok(())
}
