use watchgrid_model::OpRange;

pub fn check(text: &str, value: Option<f64>) -> anyhow::Result<()> {
    let range = OpRange::parse(text)?;
    println!("{range}");
    println!(
        "  begin: {}",
        if range.is_begin_infinite {
            "unbounded".to_string()
        } else {
            format!(
                "{} ({})",
                range.begin,
                if range.is_begin_including { "inclusive" } else { "exclusive" }
            )
        }
    );
    println!(
        "  end:   {}",
        if range.is_end_infinite {
            "unbounded".to_string()
        } else {
            format!(
                "{} ({})",
                range.end,
                if range.is_end_including { "inclusive" } else { "exclusive" }
            )
        }
    );

    if let Some(value) = value {
        let verdict = if range.contains(value) { "inside" } else { "outside" };
        println!("  {value} is {verdict}");
    }
    Ok(())
}
