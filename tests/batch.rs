mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{para, read_part, read_part_bytes, texts, vendor_template, write_docx, write_logo};
use docxside_restyle::{
    Alignment, CONFIRM_PROMPT, Config, Error, FailurePolicy, confirm_overwrite, document_files,
    export_pdf, inspect, run_batch,
};

const NO_CONVERTER: &str = "docxside-restyle-no-such-converter";

fn batch_config(dir: &Path) -> Config {
    let logo = dir.join("logo.png");
    write_logo(&logo);
    let input = dir.join("transcripts");
    fs::create_dir(&input).unwrap();
    let mut config = Config::new(input, logo);
    config.converter = PathBuf::from(NO_CONVERTER);
    config
}

fn confirm(input: &str) -> (bool, String) {
    let mut output = Vec::new();
    let answer = confirm_overwrite(input.as_bytes(), &mut output).unwrap();
    (answer, String::from_utf8(output).unwrap())
}

#[test]
fn confirmation_accepts_yes_and_no() {
    assert!(confirm("y\n").0);
    assert!(confirm("  Y \n").0);
    assert!(!confirm("n\n").0);
    assert!(!confirm("N\n").0);
}

#[test]
fn confirmation_asks_again_on_invalid_input() {
    let (answer, output) = confirm("yes\n\nmaybe\ny\n");

    assert!(answer);
    assert_eq!(output.matches(CONFIRM_PROMPT).count(), 4);
    assert_eq!(output.matches("Invalid input").count(), 3);
}

#[test]
fn confirmation_treats_end_of_input_as_no() {
    let (answer, output) = confirm("what\n");

    assert!(!answer);
    assert_eq!(output.matches(CONFIRM_PROMPT).count(), 2);
}

#[test]
fn only_docx_files_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.docx", "a.docx", "~$a.docx", "notes.txt", "old.doc"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(dir.path().join("folder.docx")).unwrap();

    let files = document_files(dir.path()).unwrap();

    assert_eq!(files, [dir.path().join("a.docx"), dir.path().join("b.docx")]);
}

#[test]
fn batch_applies_the_house_style() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path());
    let path = config.input_folder.join("rivera.docx");
    write_docx(&path, &vendor_template("UC_7_Rivera", 2));

    let report = run_batch(&config).unwrap();

    assert_eq!(report.edited, [path.clone()]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.export_failures, [path.clone()]);

    let paragraphs = inspect(&path).unwrap();
    let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "",
            "UC_07_Rivera",
            "Transcript",
            "Speaker 1 [00:00:01]: Thanks for joining.",
            "Speaker 2 [00:00:04]: Happy to be here.",
        ]
    );

    assert!(paragraphs[0].has_image);
    assert_eq!(paragraphs[0].alignment, Some(Alignment::Center));
    assert_eq!(paragraphs[1].alignment, Some(Alignment::Right));
    assert_eq!(paragraphs[2].alignment, Some(Alignment::Left));
    for heading in &paragraphs[1..3] {
        assert!(heading.runs.iter().all(|r| r.bold && r.font_size == Some(12.0)));
        assert!(heading.runs.iter().all(|r| r.font_name.as_deref() == Some("Arial")));
    }
    assert!(paragraphs.iter().flat_map(|p| &p.runs).all(|r| !r.shaded));
}

#[test]
fn second_pass_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path());
    let path = config.input_folder.join("rivera.docx");
    write_docx(&path, &vendor_template("UC_7_Rivera", 1));

    run_batch(&config).unwrap();
    let first = inspect(&path).unwrap();
    let first_xml = read_part(&path, "word/document.xml").unwrap();

    let report = run_batch(&config).unwrap();

    assert_eq!(report.edited, [path.clone()]);
    assert_eq!(inspect(&path).unwrap(), first);
    assert_eq!(read_part(&path, "word/document.xml").unwrap(), first_xml);
    assert!(read_part_bytes(&path, "word/media/image2.png").is_none());
}

#[test]
fn missing_converter_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path());
    let first = config.input_folder.join("a.docx");
    let second = config.input_folder.join("b.docx");
    write_docx(&first, &vendor_template("UC_1_Adams", 0));
    write_docx(&second, &vendor_template("UC_2_Baker", 0));

    let report = run_batch(&config).unwrap();

    assert_eq!(report.edited, [first.clone(), second.clone()]);
    assert_eq!(report.export_failures, [first, second.clone()]);
    assert_eq!(texts(&second)[1], "UC_02_Baker");
}

#[test]
fn missing_speaker_code_aborts_before_later_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path());
    let bad = config.input_folder.join("a.docx");
    let good = config.input_folder.join("b.docx");
    write_docx(&bad, &vendor_template("Interview with Adams", 0));
    write_docx(&good, &vendor_template("UC_2_Baker", 0));
    let untouched = fs::read(&good).unwrap();

    let err = run_batch(&config).unwrap_err();

    match err {
        Error::MissingSpeakerCode(path) => assert_eq!(path, bad),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read(&good).unwrap(), untouched);
    assert!(!inspect(&bad).unwrap().iter().any(|p| p.has_image));
}

#[test]
fn missing_speaker_code_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = batch_config(dir.path());
    config.on_missing_code = FailurePolicy::Skip;
    let bad = config.input_folder.join("a.docx");
    let good = config.input_folder.join("b.docx");
    write_docx(&bad, &vendor_template("Interview with Adams", 0));
    write_docx(&good, &vendor_template("UC_2_Baker", 0));

    let report = run_batch(&config).unwrap();

    assert_eq!(report.skipped, [bad.clone()]);
    assert_eq!(report.edited, [good.clone()]);
    assert!(inspect(&good).unwrap()[0].has_image);
    assert!(!inspect(&bad).unwrap().iter().any(|p| p.has_image));
}

#[test]
fn document_without_notes_is_still_edited() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path());
    let path = config.input_folder.join("short.docx");
    write_docx(&path, &[para("UC_3_Rivera"), para("Speaker 1: hello")]);

    let report = run_batch(&config).unwrap();

    assert_eq!(report.edited, [path.clone()]);
    assert_eq!(texts(&path), ["", "UC_03_Rivera", "Transcript", "Speaker 1: hello"]);
}

#[test]
fn missing_logo_aborts_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = batch_config(dir.path());
    config.logo_path = dir.path().join("missing.png");
    write_docx(&config.input_folder.join("a.docx"), &vendor_template("UC_1_Adams", 0));

    let err = run_batch(&config).unwrap_err();

    assert!(matches!(err, Error::Io(_)), "got {err}");
}

#[test]
fn export_reports_missing_converter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.docx");
    write_docx(&path, &[para("UC_1_Adams")]);

    let err = export_pdf(&path, Path::new(NO_CONVERTER)).unwrap_err();

    assert!(matches!(err, Error::ConverterNotFound(_)), "got {err}");
}

#[cfg(unix)]
#[test]
fn export_reports_failed_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.docx");
    write_docx(&path, &[para("UC_1_Adams")]);

    let err = export_pdf(&path, Path::new("false")).unwrap_err();

    match err {
        Error::ConversionFailed { path: failed, .. } => {
            assert_eq!(failed.file_name(), path.file_name());
        }
        other => panic!("unexpected error: {other}"),
    }
}
