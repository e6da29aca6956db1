use crate::infra::Workflows;
use chrono::{Local, NaiveDate};
use clap::Args;
use suivi_conducteurs::config::{EvaluatorPolicy, EvaluatorRetention};
use suivi_conducteurs::error::AppError;
use suivi_conducteurs::workflows::evaluations::{
    parse_date, CriterionId, DriverId, EvaluationSubmission, EvaluationType, NewCriterion,
    NewDriver,
};
use suivi_conducteurs::workflows::evaluators::EvaluatorId;
use suivi_conducteurs::workflows::groups::{Group, NewUser, User};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Deactivate evaluators whose user leaves every evaluator group.
    #[arg(long)]
    pub(crate) deactivate: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, deactivate } = args;
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    let retention = if deactivate {
        EvaluatorRetention::Deactivate
    } else {
        EvaluatorRetention::Retain
    };

    let workflows = Workflows::in_memory(EvaluatorPolicy { retention });
    println!("Driver evaluation demo ({today}, retention: {retention:?})");

    let marie = workflows
        .groups
        .create_user(NewUser::named("mdupont", "Marie", "Dupont"))?;
    let anne = workflows
        .groups
        .create_user(NewUser::named("aleroy", "Anne", "Leroy"))?;
    let anonymous = workflows
        .groups
        .create_user(NewUser::named("intérim", "", ""))?;
    let rh = workflows.groups.create_group("RH")?;
    let exploitation = workflows.groups.create_group("Exploitation")?;
    let accounting = workflows.groups.create_group("Comptabilité")?;

    println!("\nGroup membership");
    join(&workflows, &exploitation, &anne)?;
    join(&workflows, &rh, &anne)?;
    join(&workflows, &rh, &marie)?;
    join(&workflows, &exploitation, &anonymous)?;
    join(&workflows, &accounting, &marie)?;

    println!("\nEvaluators provisioned from groups");
    print_evaluators(&workflows)?;

    println!("\nMarie leaves RH");
    workflows.groups.remove_members(rh.id, &[marie.id])?;
    print_evaluators(&workflows)?;

    println!("\nRH history");
    for entry in workflows.groups.group_history(rh.id)? {
        println!("- [{}] {}", entry.action.label(), entry.details);
    }

    let Some(evaluator) = workflows.evaluators.for_user(anne.id)? else {
        println!("\nAnne has no evaluator record; skipping evaluations");
        return Ok(());
    };
    let catalogue = seed_catalogue(&workflows)?;

    println!("\nEvaluation submission");
    let submission = catalogue.submission(evaluator.evaluator.id, today, 4, "9");
    let evaluation = workflows.evaluations.submit(submission)?;
    let detail = workflows.evaluations.detail(evaluation.id)?;
    println!(
        "  Recorded evaluation #{} of {} by {} ({})",
        evaluation.id,
        detail.driver.full_name(),
        detail.evaluator.display_name,
        detail.evaluation_type.name
    );
    for note in &detail.notes {
        println!(
            "  - {}: {} (range {}..={})",
            note.criterion, note.value, note.min, note.max
        );
    }
    println!(
        "  Average {:.2} over {}/{} criteria",
        detail.stats.average, detail.stats.scored, detail.stats.total_criteria
    );

    println!("\nRejected submissions");
    let rejections = [
        (
            "out of range",
            catalogue.submission(evaluator.evaluator.id, today, 7, "5"),
        ),
        (
            "duplicate",
            catalogue.submission(evaluator.evaluator.id, today, 4, "9"),
        ),
        (
            "not a number",
            catalogue.submission(evaluator.evaluator.id, today, 3, "neuf"),
        ),
        ("empty form", EvaluationSubmission::default()),
    ];
    for (label, submission) in rejections {
        match workflows.evaluations.submit(submission) {
            Ok(evaluation) => println!("  {label}: unexpectedly accepted as #{}", evaluation.id),
            Err(err) => println!("  {label}: {err}"),
        }
    }

    let dashboard = workflows.evaluations.dashboard(today)?;
    println!(
        "\nDashboard: {} active driver(s), {} evaluation(s), {} this month",
        dashboard.active_drivers, dashboard.total_evaluations, dashboard.evaluations_this_month
    );

    Ok(())
}

fn join(workflows: &Workflows, group: &Group, user: &User) -> Result<(), AppError> {
    let change = workflows.groups.add_members(group.id, &[user.id])?;
    println!(
        "  {} joined {} ({} new membership)",
        user.username,
        group.name,
        change.user_ids.len()
    );
    Ok(())
}

fn print_evaluators(workflows: &Workflows) -> Result<(), AppError> {
    let evaluators = workflows.evaluators.list()?;
    if evaluators.is_empty() {
        println!("  none");
    }
    for view in evaluators {
        let service = view
            .service
            .as_ref()
            .map(|service| format!("{} ({})", service.name, service.abbreviation))
            .unwrap_or_else(|| "no service".to_string());
        let state = if view.evaluator.active {
            "active"
        } else {
            "inactive"
        };
        println!("  - {} | {} | {}", view.display_name, service, state);
    }
    Ok(())
}

struct DemoCatalogue {
    driver: DriverId,
    evaluation_type: EvaluationType,
    punctuality: CriterionId,
    safety: CriterionId,
}

impl DemoCatalogue {
    fn submission(
        &self,
        evaluator: EvaluatorId,
        evaluated_on: NaiveDate,
        punctuality: i64,
        safety: &str,
    ) -> EvaluationSubmission {
        EvaluationSubmission::new(self.driver, evaluator, self.evaluation_type.id, evaluated_on)
            .with_note(self.punctuality, punctuality)
            .with_note(self.safety, safety)
    }
}

fn seed_catalogue(workflows: &Workflows) -> Result<DemoCatalogue, AppError> {
    let evaluations = &workflows.evaluations;
    let company = evaluations.create_company("Transports Rive")?;
    let site = evaluations.create_site("Lyon Gerland")?;
    let driver = evaluations.create_driver(NewDriver {
        last_name: "Martin".to_string(),
        first_name: "Paul".to_string(),
        active: true,
        company_id: company.id,
        site_id: site.id,
    })?;
    let evaluation_type = evaluations.create_evaluation_type("Conduite")?;
    let punctuality = evaluations.create_criterion(NewCriterion {
        evaluation_type_id: evaluation_type.id,
        name: "Ponctualité".to_string(),
        min: 1,
        max: 5,
        active: true,
    })?;
    let safety = evaluations.create_criterion(NewCriterion {
        evaluation_type_id: evaluation_type.id,
        name: "Sécurité".to_string(),
        min: 0,
        max: 10,
        active: true,
    })?;

    Ok(DemoCatalogue {
        driver: driver.id,
        evaluation_type,
        punctuality: punctuality.id,
        safety: safety.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2024, 1, 10),
            deactivate: true,
        };
        run_demo(args).expect("demo completes");
    }
}
