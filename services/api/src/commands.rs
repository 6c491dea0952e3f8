use crate::infra::build_scoring_service;
use clap::Args;
use loan_scoring::config::AppConfig;
use loan_scoring::error::AppError;
use loan_scoring::scoring::{LoanAssessment, ModelStatusView};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// JSON file holding the application fields. Reads stdin when omitted.
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Print the assessment as JSON instead of text.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let payload: Value = serde_json::from_str(&raw)?;

    let config = AppConfig::load()?;
    let service = build_scoring_service(&config.scoring);
    let assessment = service.assess_json(payload)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", render_assessment(&assessment));
    }
    Ok(())
}

pub(crate) fn run_model_status() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_scoring_service(&config.scoring);
    let status = service.model_status()?;

    print!("{}", render_model_status(&status));
    Ok(())
}

fn render_assessment(assessment: &LoanAssessment) -> String {
    let mut out = format!(
        "Score: {}/100 ({})\nStrategy: {}\n",
        assessment.score,
        assessment.band.label(),
        assessment.strategy
    );
    for message in assessment.messages() {
        out.push_str(&format!("  - {message}\n"));
    }
    out
}

fn render_model_status(status: &ModelStatusView) -> String {
    format!(
        "Active strategy: {}\nDecided records at selection: {}\nSelected at: {}\n",
        status.strategy,
        status.training_records,
        status.trained_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_scoring::scoring::{
        ExplanationComponent, ExplanationFactor, ScoreBand, StrategyKind,
    };

    #[test]
    fn renders_score_band_and_explanations() {
        let assessment = LoanAssessment {
            score: 89,
            band: ScoreBand::Strong,
            strategy: StrategyKind::RuleBased,
            explanations: vec![ExplanationComponent {
                factor: ExplanationFactor::CreditScore,
                message: "Your good credit score is a positive factor.".to_string(),
            }],
        };

        let rendered = render_assessment(&assessment);

        assert!(rendered.starts_with("Score: 89/100 (strong)\n"));
        assert!(rendered.contains("Strategy: rule_based\n"));
        assert!(rendered.contains("  - Your good credit score is a positive factor.\n"));
    }
}
