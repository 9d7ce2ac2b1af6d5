use crate::exit_codes;
use crate::output;
use eegfmri_clean::{BidsFile, DatasetSummary, Step};
use serde::Serialize;

#[derive(Serialize)]
struct Listing<'a> {
    steps: &'a [Step],
    summary: DatasetSummary,
    files: &'a [BidsFile],
}

/// Print the selected files without running any step.
pub fn execute(files: &[BidsFile], steps: &[Step], json: bool, quiet: bool) -> i32 {
    if json {
        let listing = Listing {
            steps,
            summary: DatasetSummary::from_files(files),
            files,
        };
        let written = output::to_json(&listing).and_then(|j| output::write_stdout(&j));
        return match written {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::EXECUTION_ERROR
            }
        };
    }

    for file in files {
        if let Err(e) = output::write_stdout(&file.path.display().to_string()) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    }
    if !quiet {
        eprintln!("{}", DatasetSummary::from_files(files));
    }
    exit_codes::SUCCESS
}
