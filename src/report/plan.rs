use std::path::Path;

use crate::errors::Result;
use crate::execution::{plan_rows, PlanRow, RemovalPlan};

/// Write `removal-plan.csv`, one row per step in execution order.
pub fn write_plan_csv(path: &Path, plan: &RemovalPlan) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let rows = plan_rows(plan);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} plan rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_plan_csv(path: &Path) -> Result<Vec<PlanRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<PlanRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::execution::plan_from_rows;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("removal-plan.csv");
        std::fs::write(
            &path,
            "Phase,Action Type,Item Path,Command,Linked Skill,Prerequisites,Verification Steps,Rollback Command\n\
             1,remove_immediately,old,git rm -r -- old,/skill-code-folder-remove,Create backup branch,Run tests; Build project,git checkout HEAD -- old\n",
        )
        .unwrap();

        let rows = read_plan_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].linked_tool, "/skill-code-folder-remove");

        let plan = plan_from_rows(&rows, &ExecutionConfig::default()).unwrap();
        let out = temp.path().join("rewritten.csv");
        write_plan_csv(&out, &plan).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            std::fs::read_to_string(&path).unwrap()
        );
    }
}
