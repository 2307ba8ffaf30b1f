//! Background batch worker.
//!
//! Captures are queued up front and processed `batch_size` at a time, one
//! scoped thread per capture. Each finished [`Report`] is sent back over a
//! channel as soon as its batch completes.

use std::{
	fs,
	path::{Path, PathBuf},
	sync::mpsc::{self, Receiver},
};

use tracing::{info, warn};

use crate::config::Config;
use crate::report::{Report, REPORT_FILE};

#[derive(Debug, Clone)]
struct Task {
	input: PathBuf,
	dir: PathBuf,
}

pub type ReportReceiver = Receiver<Report>;

/// Start processing `inputs` on a background thread.
///
/// The receiver yields one report per input, in input order, and disconnects
/// once every capture has been handled.
pub fn spawn(inputs: Vec<PathBuf>, config: Config) -> ReportReceiver {
	let (tx, rx) = mpsc::channel();

	std::thread::spawn(move || {
		let tasks = plan(&inputs, &config.output_dir);
		let batch_size = config.batch_size.max(1);
		let mut remaining = tasks.len();

		for batch in tasks.chunks(batch_size) {
			remaining -= batch.len();
			info!(size = batch.len(), remaining, "processing batch");

			let reports = std::thread::scope(|s| {
				let handles = batch
					.iter()
					.map(|task| s.spawn(|| process(task, &config)))
					.collect::<Vec<_>>();
				handles
					.into_iter()
					.map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
					.collect::<Vec<_>>()
			});

			for report in reports {
				// Receiver gone means nobody is listening anymore; stop early.
				if tx.send(report).is_err() {
					return;
				}
			}
		}
	});

	rx
}

/// One artifact directory per input, numbered so equal file names don't collide.
fn plan(inputs: &[PathBuf], output_dir: &Path) -> Vec<Task> {
	inputs
		.iter()
		.enumerate()
		.map(|(i, input)| {
			let stem = input
				.file_stem()
				.map(|s| s.to_string_lossy().into_owned())
				.unwrap_or_else(|| "capture".to_string());
			Task {
				input: input.clone(),
				dir: output_dir.join(format!("{:03}-{}", i + 1, stem)),
			}
		})
		.collect()
}

fn process(task: &Task, config: &Config) -> Report {
	let outputs = match fs::create_dir_all(&task.dir) {
		Ok(()) => ie::Outputs::in_dir(&task.dir, config.write_debug_overlay),
		Err(err) => {
			warn!(error = %err, dir = ?task.dir, "cannot create output directory; skipping artifacts");
			ie::Outputs::default()
		}
	};

	let report = match ie::scan_file(&task.input, &outputs) {
		Ok(scan) => Report::detected(&task.input, &task.dir, &scan),
		Err(err) => {
			info!(input = ?task.input, reason = %err, "no card detected");
			Report::missed(&task.input, &task.dir, &err)
		}
	};

	if config.write_report && task.dir.is_dir() {
		if let Err(err) = report.save(task.dir.join(REPORT_FILE)) {
			warn!(error = %format!("{err:#}"), "failed to write report");
		}
	}

	report
}

#[cfg(test)]
mod tests {
	use super::*;
	use ie::{Color, OwnedImage};

	fn run(inputs: Vec<PathBuf>, config: Config) -> Vec<Report> {
		spawn(inputs, config).into_iter().collect()
	}

	fn card_capture() -> OwnedImage {
		let mut img = OwnedImage::new(400, 300, Color::new(24, 24, 28));
		img.fill_rect(50, 50, 301, 201, Color::hex(0x784da9));
		img.fill_rect(53, 53, 295, 195, Color::new(40, 36, 48));
		img
	}

	#[test]
	fn plan_numbers_output_dirs() {
		let tasks = plan(&[PathBuf::from("a/shot.png"), PathBuf::from("b/shot.png")], Path::new("out"));
		assert_eq!(tasks[0].dir, Path::new("out/001-shot"));
		assert_eq!(tasks[1].dir, Path::new("out/002-shot"));
	}

	#[test]
	fn batch_reports_every_input_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let card = dir.path().join("card.png");
		let blank = dir.path().join("blank.png");
		card_capture().as_image().save_png(&card).unwrap();
		OwnedImage::new(200, 200, Color::BLACK).as_image().save_png(&blank).unwrap();

		let config = Config {
			output_dir: dir.path().join("out"),
			batch_size: 2,
			write_debug_overlay: true,
			write_report: true,
		};
		let reports = run(vec![card.clone(), blank.clone(), dir.path().join("missing.png")], config);

		assert_eq!(reports.len(), 3);
		assert_eq!(reports[0].input, card);
		assert_eq!(reports[0].status, "NORMAL");
		assert!(reports[0].is_detected());
		assert_eq!(reports[1].status, crate::report::NO_UI_DETECTED);
		assert_eq!(reports[2].status, crate::report::NO_UI_DETECTED);

		let first = &reports[0].output_dir;
		for file in ["card.png", "name.png", "debug_result.png", REPORT_FILE] {
			assert!(first.join(file).exists(), "{file} missing");
		}
		assert!(reports[1].output_dir.join(REPORT_FILE).exists());
	}
}
