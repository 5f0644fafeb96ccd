//! Clustering a small class by academics, attendance and club membership
//!
//! Run with `RUST_LOG=kluster=debug` to follow every restart.

use kluster::{ClusteringConfig, FittedModel, RawTable, Record, Schema};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kluster=info")),
        )
        .init();

    let table = RawTable::from_strs(
        &[
            "No", "Name", "Gender", "Class", "Academic Score", "Attendance",
            "Computer Club", "Agriculture Club", "Sewing Club", "Scouting",
        ],
        &[
            &["1", "Amina", "F", "JSS1", "92", "0.97", "1", "0", "1", "1"],
            &["2", "Bello", "M", "JSS1", "88", "0.95", "1", "1", "0", "1"],
            &["3", "Chidi", "M", "JSS2", "95", "0.99", "1", "1", "1", "1"],
            &["4", "Damilola", "F", "JSS2", "61", "0.72", "0", "0", "0", "0"],
            &["5", "Emeka", "M", "JSS3", "", "0.68", "0", "1", "0", "0"],
            &["6", "Funke", "F", "JSS3", "58", "0.75", "0", "", "0", "0"],
            &["7", "Gbenga", "M", "JSS1", "74", "0.90", "0", "1", "1", "0"],
            &["8", "Halima", "F", "JSS2", "77", "0.88", "0", "1", "1", "0"],
            &["9", "Ifeanyi", "M", "JSS3", "71", "0.86", "0", "1", "1", "1"],
        ],
    );

    println!("=== Fitting ===");
    let config = ClusteringConfig::new(3).n_restarts(10).seed(42);
    let model = FittedModel::fit_table(&table, &Schema::student(), &config)?;

    for entry in &model.imputation().entries {
        println!(
            "Imputed {} with mean {:.2} for rows {:?}",
            entry.column, entry.mean, entry.rows
        );
    }
    println!(
        "Cost: {:.4} after {} iterations (restart {}, gamma {:.4}, converged: {})",
        model.result().cost,
        model.result().n_iter,
        model.result().restart,
        model.gamma(),
        model.result().converged
    );
    println!();

    println!("=== Clusters ===");
    for summary in model.cluster_summaries() {
        println!("Cluster {} ({} students)", summary.label, summary.size);
        println!("  {}", summary.description);
    }
    println!();

    println!("=== Assignments ===");
    for assignment in model.assignments() {
        println!("  {} -> cluster {}", assignment.id, assignment.label);
    }
    println!();

    println!("=== New student ===");
    let newcomer = Record::new("10", vec![83.0, 0.93], vec![1, 0, 0, 1]);
    let prediction = model.predict(&newcomer)?;
    println!("Cluster {}: {}", prediction.label, prediction.description);
    println!();

    println!("=== Report data for student 5 ===");
    let row = model.export_row("5")?;
    println!("  Name: {}", row.extras.get("Name").map(String::as_str).unwrap_or("-"));
    for (column, value) in &row.numeric {
        println!("  {}: {:.2}", column, value);
    }
    for (column, value) in &row.categorical {
        println!("  {}: {}", column, value);
    }
    println!("  Cluster {}: {}", row.label, row.description);

    Ok(())
}
