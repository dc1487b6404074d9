//! `delivery-note total` and `numeral` command implementations

use anyhow::{Context, Result};
use cn_text::try_format_rmb_uppercase;
use std::path::PathBuf;

use super::{open_store, read_note_file};

pub fn run(note_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let file = read_note_file(&note_path)?;
    let settings = match file.settings {
        Some(settings) => settings,
        None => open_store(data_dir)?.load_settings(),
    };
    let result = delivery_note::aggregate_with_rate(&file.items, settings.tax_rate);
    let summary = result.summary();

    for (index, amount) in summary.row_amounts.iter().enumerate() {
        println!("{:>4}  {amount:>14}", index + 1);
    }
    println!("合计金额：{}", summary.subtotal);
    println!("税率：{}", summary.tax_rate);
    println!("税额：{}", summary.tax_amount);
    println!("价税合计：{}", summary.grand_total);
    println!("大写金额：{}", summary.amount_in_words);
    Ok(())
}

pub fn numeral(amount: f64) -> Result<()> {
    let text = try_format_rmb_uppercase(amount)
        .with_context(|| format!("Cannot express {amount} in numerals"))?;
    println!("{text}");
    Ok(())
}
