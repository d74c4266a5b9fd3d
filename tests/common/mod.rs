use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a daily accounting file (`YYYYMMDD`) into `dir`.
#[allow(dead_code)]
pub fn create_accounting_file(dir: &Path, day: &str, lines: &[&str]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(dir.join(day), content)?;
    Ok(())
}

/// Accounting directory with two consecutive days of records (2024-01-02, 2024-01-03).
///
/// - job 100: alice/phys on workq, 4 cpus, 10:00 -> 11:00 on day one (14_400)
/// - job 200: bob/chem on workq, 2 cpus, day one 23:00 -> day two 01:00 (14_400)
/// - job 300: carol/phys, starts in routeq at day one 23:30 with 1 cpu, Running
///   checkpoint on day two 02:00 in workq, never exits
/// - job 400: orphan Deleted on day two 03:00 with 8 cpus and no Start
#[allow(dead_code)]
pub fn setup_accounting_dir() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;

    create_accounting_file(
        temp_dir.path(),
        "20240102",
        &[
            "01/02/2024 09:59:00;Q;100.server;queue=workq",
            "01/02/2024 10:00:00;S;100.server;user=alice group=phys queue=workq Resource_List.ncpus=4",
            "01/02/2024 11:00:00;E;100.server;user=alice group=phys queue=workq Resource_List.ncpus=4",
            "01/02/2024 23:00:00;S;200.server;user=bob group=chem queue=workq Resource_List.ncpus=2",
            "01/02/2024 23:30:00;S;300.server;user=carol group=phys queue=routeq Resource_List.ncpus=1",
        ],
    )?;

    create_accounting_file(
        temp_dir.path(),
        "20240103",
        &[
            "01/03/2024 00:10:00;L;license;floating license",
            "01/03/2024 01:00:00;E;200.server;user=bob group=chem queue=workq Resource_List.ncpus=2",
            "01/03/2024 02:00:00;R;300.server;queue=workq",
            "01/03/2024 03:00:00;D;400.server;requestor=root@server Resource_List.ncpus=8",
        ],
    )?;

    Ok(temp_dir)
}
