//! The `sqlgrade init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    // Create sqlgrade.toml
    if Path::new("sqlgrade.toml").exists() {
        println!("sqlgrade.toml already exists, skipping.");
    } else {
        std::fs::write("sqlgrade.toml", SAMPLE_CONFIG).context("failed to write sqlgrade.toml")?;
        println!("Created sqlgrade.toml");
    }

    // Create example question bank
    std::fs::create_dir_all("question-banks").context("failed to create question-banks/")?;
    let example_path = Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)
            .context("failed to write question-banks/example.toml")?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add your own questions to question-banks/");
    println!("  2. Run: sqlgrade validate --bank question-banks/example.toml");
    println!("  3. Run: sqlgrade take --name \"Your Name\" --email you@example.com");
    println!("  4. Run: sqlgrade results");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# sqlgrade configuration

question_bank = "./question-banks/example.toml"
submissions_dir = "./submissions"

# Shuffle question order per candidate (seeded by email, so reproducible).
shuffle = true

# Draw a fixed number of questions per difficulty. Remove this table to ask
# every question in the bank.
[questions_per_difficulty]
beginner = 2
medium = 1
hard = 1
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Question Bank"
description = "A few Northwind questions to get started"

[[questions]]
id = 1
title = "Which shippers do we have?"
description = "Return all the fields from all the shippers."
difficulty = "beginner"
solution = "SELECT * FROM shippers"

[[questions.tables]]
table = "shippers"
columns = ["shipperid (INT, PK)", "companyname (VARCHAR)", "phone (VARCHAR)"]
sample = "shipperid: 1, companyname: 'Speedy Express', phone: '(503) 555-9831'"

[[questions]]
id = 2
title = "Certain fields from Categories"
description = "Show the category name and its description for every category."
difficulty = "beginner"
solution = "SELECT categoryname, description FROM categories"

[[questions.tables]]
table = "categories"
columns = ["categoryid (INT, PK)", "categoryname (VARCHAR)", "description (TEXT)"]

[[questions]]
id = 3
title = "Filtering aggregated rows"
description = "Which clause filters groups after GROUP BY has been applied?"
difficulty = "medium"
kind = "multiple_choice"
choices = ["WHERE", "HAVING", "ORDER BY", "LIMIT"]
answer = 1

[[questions]]
id = 4
title = "Products with associated supplier names"
description = "Show the product id, product name, and supplier company name, ordered by product id."
difficulty = "hard"
solution = "SELECT productid, productname, companyname FROM products INNER JOIN suppliers ON products.supplierid = suppliers.supplierid ORDER BY productid"
relationship = "products.supplierid -> suppliers.supplierid"

[[questions.tables]]
table = "products"
columns = ["productid (INT, PK)", "productname (VARCHAR)", "supplierid (INT, FK)"]

[[questions.tables]]
table = "suppliers"
columns = ["supplierid (INT, PK)", "companyname (VARCHAR)"]
"#;
