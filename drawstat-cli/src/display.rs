use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use drawstat_analysis::chi_square::ChiSquareTest;
use drawstat_analysis::distribution::{SplitDistribution, SplitKind, SumDistribution};
use drawstat_analysis::ensemble::EnsembleReport;
use drawstat_analysis::frequency::{CandidateFrequency, DigitPosition, FrequencyResult, FrequencyTag, WeightedCount};
use drawstat_analysis::gap::{DigitGapResult, GapResult};
use drawstat_analysis::patterns::{FourDPatternSummary, TotoPatternSummary};
use drawstat_analysis::strategy::StrategyOutput;
use drawstat_db::models::{DrawHistory, FourDNumber};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn join_four_d(numbers: &[FourDNumber]) -> String {
    numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
}

fn tag_cell(tag: FrequencyTag) -> Cell {
    let color = match tag {
        FrequencyTag::Hot => Color::Green,
        FrequencyTag::Cold => Color::Red,
        FrequencyTag::Normal => Color::White,
    };
    Cell::new(tag.to_string()).fg(color)
}

pub fn display_draws(history: &DrawHistory) {
    if history.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    match history {
        DrawHistory::Toto(draws) => {
            let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Additionnel", "Démo"]);
            for draw in draws {
                table.add_row(vec![
                    draw.draw_id.clone(),
                    draw.date.to_string(),
                    join_numbers(&draw.winning),
                    format!("{:2}", draw.additional),
                    if draw.is_demo { "oui" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        DrawHistory::FourD(draws) => {
            let mut table = new_table(vec!["Tirage", "Date", "1er", "2e", "3e", "Starters", "Consolation"]);
            for draw in draws {
                table.add_row(vec![
                    draw.draw_id.clone(),
                    draw.date.to_string(),
                    draw.first.to_string(),
                    draw.second.to_string(),
                    draw.third.to_string(),
                    join_four_d(&draw.starters),
                    join_four_d(&draw.consolation),
                ]);
            }
            println!("{table}");
        }
    }
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn frequency_rows(table: &mut Table, candidates: &[&CandidateFrequency], label: impl Fn(&CandidateFrequency) -> String) {
    for c in candidates {
        table.add_row(vec![
            Cell::new(label(c)),
            Cell::new(c.count),
            Cell::new(format!("{:+.3}", c.deviation)),
            tag_cell(c.tag),
        ]);
    }
}

pub fn display_frequency(frequency: &FrequencyResult) {
    println!(
        "\n📊 Fréquences sur {} tirages (attendu : {:.2} par candidat)\n",
        frequency.draws, frequency.expected
    );

    let toto: Vec<&CandidateFrequency> = frequency.candidates.iter().filter(|c| c.position.is_none()).collect();
    if !toto.is_empty() {
        let mut sorted = toto;
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        let mut table = new_table(vec!["Numéro", "Sorties", "Écart", "Tag"]);
        frequency_rows(&mut table, &sorted, |c| format!("{:2}", c.candidate));
        println!("{table}");
        println!("Chauds : {}", join_numbers(&frequency.hot_numbers()));
        println!("Froids : {}", join_numbers(&frequency.cold_numbers()));
        return;
    }

    for pos in DigitPosition::ALL {
        println!("── Position : {} ──", pos.label());
        let digits: Vec<&CandidateFrequency> = frequency.position(pos).collect();
        let mut table = new_table(vec!["Chiffre", "Sorties", "Écart", "Tag"]);
        frequency_rows(&mut table, &digits, |c| c.candidate.to_string());
        println!("{table}");
    }
}

pub fn display_gaps(gaps: &GapResult) {
    println!("\n⏳ Retards (écart attendu : {:.2} tirages)\n", gaps.expected_gap);

    let mut table = new_table(vec!["Rang", "Numéro", "Retard"]);
    for (i, g) in gaps.most_overdue.iter().enumerate() {
        table.add_row(vec![
            format!("{}", i + 1),
            format!("{:2}", g.number),
            g.gap.to_string(),
        ]);
    }
    println!("{table}");

    let overdue = gaps.overdue_numbers();
    if overdue.is_empty() {
        println!("Aucun numéro au-delà de 1,5 fois l'écart attendu.");
    } else {
        println!("En retard (> 1,5 × attendu) : {}", join_numbers(&overdue));
    }

    let recent: Vec<u8> = gaps.recently_appeared.iter().map(|g| g.number).collect();
    println!("Sortis récemment : {}", join_numbers(&recent));
}

pub fn display_digit_gaps(gaps: &DigitGapResult) {
    println!("\n⏳ Retards par position (écart attendu : {:.1} tirages)\n", gaps.expected_gap);

    let mut header = vec!["Position"];
    let digits: Vec<String> = (0..10).map(|d| d.to_string()).collect();
    header.extend(digits.iter().map(String::as_str));
    header.push("En retard");
    let mut table = new_table(header);
    for pos in &gaps.positions {
        let mut row = vec![Cell::new(pos.position.label())];
        for (digit, gap) in pos.gaps.iter().enumerate() {
            let cell = Cell::new(gap);
            row.push(if pos.overdue.contains(&(digit as u8)) { cell.fg(Color::Red) } else { cell });
        }
        let overdue: Vec<String> = pos.overdue.iter().map(|d| d.to_string()).collect();
        row.push(Cell::new(overdue.join(" ")));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_time_weighted(weighted: &[WeightedCount], decay: f64) {
    println!("\n🕒 Fréquence pondérée dans le temps (décroissance {decay} par tirage)\n");

    let mut table = new_table(vec!["Rang", "Numéro", "Score"]);
    for (i, w) in weighted.iter().enumerate() {
        table.add_row(vec![format!("{}", i + 1), format!("{:2}", w.number), format!("{:.3}", w.score)]);
    }
    println!("{table}");
}

pub fn display_sums(sums: &SumDistribution) {
    println!("\n➕ Distribution des sommes ({} échantillons)\n", sums.samples);
    println!("  Moyenne : {:.2}   Écart type : {:.2}", sums.mean, sums.std_dev);
    println!("  Min : {}   Médiane : {}   Max : {}", sums.min, sums.median, sums.max);
    let (low, high) = sums.typical_range();
    println!("  Plage courante (moyenne ± écart type) : {low}-{high}");

    let mut table = new_table(vec!["Somme", "Sorties"]);
    for (sum, count) in &sums.most_common {
        table.add_row(vec![sum.to_string(), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_splits(dist: &SplitDistribution) {
    let title = match dist.kind {
        SplitKind::OddEven => "Impairs / pairs",
        SplitKind::LowHigh => "Bas / hauts",
    };
    println!("\n⚖ {} sur {} tirages\n", title, dist.draws);

    let mut table = new_table(vec!["Répartition", "Tirages", "%"]);
    for split in &dist.splits {
        table.add_row(vec![
            dist.label(split),
            split.count.to_string(),
            format!("{:.1}", split.percentage),
        ]);
    }
    println!("{table}");
}

pub fn display_chi_square(tests: &[ChiSquareTest]) {
    println!("\n🧪 Test du χ² d'uniformité\n");

    let mut table = new_table(vec!["Portée", "χ²", "ddl", "Seuil 95%", "Seuil 99%", "Verdict"]);
    for t in tests {
        let scope = t.position.map(|p| p.label().to_string()).unwrap_or_else(|| "numéros".to_string());
        table.add_row(vec![
            scope,
            format!("{:.2}", t.statistic),
            t.degrees_of_freedom.to_string(),
            format!("{:.2}", t.critical_95),
            format!("{:.2}", t.critical_99),
            t.verdict.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_toto_patterns(summary: &TotoPatternSummary, pairs: &[((u8, u8), u32)]) {
    println!("\n🔎 Motifs Toto\n");
    if summary.draws > 0 {
        println!(
            "  Tirages avec numéros consécutifs : {} ({:.1}%)",
            summary.with_consecutive,
            summary.with_consecutive as f64 * 100.0 / summary.draws as f64
        );
    }
    println!("  Somme moyenne : {:.1}", summary.average_sum);

    let mut table = new_table(vec!["Dizaine", "Sorties"]);
    for (i, count) in summary.decades.iter().enumerate() {
        let range = if i == 0 { "1-9".to_string() } else { format!("{}-{}", i * 10, i * 10 + 9) };
        table.add_row(vec![range, count.to_string()]);
    }
    println!("{table}");

    if !pairs.is_empty() {
        let mut table = new_table(vec!["Paire", "Sorties"]);
        for ((a, b), count) in pairs {
            table.add_row(vec![format!("{:2} - {:2}", a, b), count.to_string()]);
        }
        println!("{table}");
    }
}

pub fn display_four_d_patterns(summary: &FourDPatternSummary) {
    println!("\n🔎 Motifs des prix classés ({} numéros)\n", summary.total_numbers);

    let mut table = new_table(vec!["Motif", "Nombre", "%"]);
    for (pattern, count) in &summary.counts {
        table.add_row(vec![
            pattern.label().to_string(),
            count.to_string(),
            format!("{:.1}", summary.percentage(*count)),
        ]);
    }
    println!("{table}");

    if let Some((sum, count)) = summary.most_common_sum {
        println!("  Somme des chiffres la plus fréquente : {} ({} fois)", sum, count);
    }
    println!(
        "  Premier chiffre = dernier : {:.1}%",
        summary.percentage(summary.first_last_same)
    );
}

pub fn display_selections(outputs: &[StrategyOutput]) {
    println!("\n🎲 Sélections\n");

    let mut table = new_table(vec!["#", "Stratégie", "Numéros", "Explication"]);
    for (i, out) in outputs.iter().enumerate() {
        let strategy = if out.fallback {
            format!("{} (repli)", out.strategy)
        } else {
            out.strategy.to_string()
        };
        table.add_row(vec![
            format!("{}", i + 1),
            strategy,
            out.picks.to_string(),
            out.explanation.clone(),
        ]);
    }
    println!("{table}");
}

pub fn display_report(report: &EnsembleReport) {
    println!("\n🤖 Prédiction d'ensemble ({})\n", report.domain);

    let mut table = new_table(vec!["Confiance", "Stratégie", "Numéros", "Add.", "Raisonnement"]);
    for entry in &report.predictions {
        table.add_row(vec![
            entry.confidence.to_string(),
            entry.output.strategy.to_string(),
            entry.output.picks.to_string(),
            entry.additional.map(|n| n.to_string()).unwrap_or_default(),
            entry.reasoning.to_string(),
        ]);
    }
    println!("{table}");
    println!("{}", report.analysis_summary);
    println!("Généré le {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
