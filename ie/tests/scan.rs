use ie::{Color, DetectError, OwnedImage, Outputs, VariantVerdict};

const BACKGROUND: Color = Color::new(24, 24, 28);
const PANEL: Color = Color::new(40, 36, 48);
const BORDER: Color = Color::hex(0x784da9);
const TAG: Color = Color::hex(0xa378f9);
const GRAY: Color = Color::hex(0x878788);

/// 400×300 capture: frame (50,50)-(350,250), tag at y=60..65, gradient at
/// y=70..110 with 100 distinct colors, gray description at y=120..125.
fn capture() -> OwnedImage {
    let mut img = OwnedImage::new(400, 300, BACKGROUND);
    img.fill_rect(50, 50, 301, 201, BORDER);
    img.fill_rect(53, 53, 295, 195, PANEL);
    img.fill_rect(70, 60, 130, 6, TAG);
    for y in 70..=110 {
        for i in 0..100u32 {
            img.put(150 + i, y, Color::new(55 + 2 * i as u8, 120, 30));
        }
    }
    img.fill_rect(70, 120, 230, 6, GRAY);
    img
}

fn assert_near(actual: u32, expected: u32) {
    assert!(actual.abs_diff(expected) <= 3, "{actual} vs {expected}");
}

#[test]
fn rainbow_card_end_to_end() {
    let img = capture();
    let scan = ie::scan(img.as_image()).unwrap();

    assert_near(scan.bounds.left, 50);
    assert_near(scan.bounds.top, 50);
    assert_near(scan.bounds.right, 350);
    assert_near(scan.bounds.bottom, 250);

    assert_eq!(
        scan.classification.verdict,
        VariantVerdict {
            golden: false,
            rainbow: true,
            shiny: false,
        }
    );
    assert_eq!(scan.classification.verdict.to_string(), "RAINBOW");
    assert_eq!(scan.name.width(), scan.card.width());
    assert_eq!(scan.name.height(), scan.card.height() / 4);
}

#[test]
fn golden_pixel_wins_over_gradient() {
    let mut img = capture();
    img.put(300, 200, Color::hex(0xfee844));
    let scan = ie::scan(img.as_image()).unwrap();

    assert!(scan.classification.verdict.golden);
    assert!(!scan.classification.verdict.rainbow);
    let audit = scan.classification.audit.unwrap();
    assert_eq!((audit.width(), audit.height()), (scan.card.width(), scan.card.height()));
}

#[test]
fn artifacts_are_written_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    capture().as_image().save_png(&path).unwrap();

    let outputs = Outputs::in_dir(dir.path(), true);
    let scan = ie::scan_file(&path, &outputs).unwrap();

    for file in ["card.png", "name.png", "variant.png", "debug_result.png"] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }
    let card = OwnedImage::load(dir.path().join("card.png")).unwrap();
    assert_eq!(card, scan.card);
}

#[test]
fn unwritable_outputs_do_not_fail_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = Outputs {
        card: Some(dir.path().join("missing").join("card.png")),
        ..Default::default()
    };
    let img = capture();
    assert!(ie::pipeline::scan(img.as_image(), &outputs).is_ok());
}

#[test]
fn undecodable_source_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, b"not an image").unwrap();

    assert!(matches!(
        ie::scan_file(&path, &Outputs::default()),
        Err(DetectError::SourceUnreadable { .. })
    ));
    assert!(matches!(
        ie::scan_file(dir.path().join("nope.png"), &Outputs::default()),
        Err(DetectError::SourceUnreadable { .. })
    ));
}

#[test]
fn capture_without_card_is_no_detection() {
    let img = OwnedImage::new(400, 300, BACKGROUND);
    assert!(matches!(
        ie::scan(img.as_image()),
        Err(DetectError::NoColorMatch { .. })
    ));
}
