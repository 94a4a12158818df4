//! Renders seven-segment digits and reads them back through the full
//! pipeline with a recognizer that samples segment centres.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use odoscan_ocr::{
    BoundingBox, FnRecognizer, MileagePipeline, OcrError, RecognitionError, TextObservation,
};

const MARGIN: u32 = 8;
const CELL_W: u32 = 24;
const CELL_H: u32 = 40;

/// Segment rectangles `(x0, y0, x1, y1)` inside a cell, in `abcdefg` order.
const SEGMENTS: [(u32, u32, u32, u32); 7] = [
    (4, 2, 20, 6),    // a
    (18, 4, 22, 20),  // b
    (18, 20, 22, 36), // c
    (4, 34, 20, 38),  // d
    (2, 20, 6, 36),   // e
    (2, 4, 6, 20),    // f
    (4, 18, 20, 22),  // g
];

/// Sample point at the centre of each segment.
const PROBES: [(u32, u32); 7] = [(12, 4), (20, 12), (20, 28), (12, 36), (4, 28), (4, 12), (12, 20)];

/// Lit segments per digit, bit 0 = a … bit 6 = g.
const DIGITS: [u8; 10] = [
    0b011_1111, // 0
    0b000_0110, // 1
    0b101_1011, // 2
    0b100_1111, // 3
    0b110_0110, // 4
    0b110_1101, // 5
    0b111_1101, // 6
    0b000_0111, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

fn render(digits: &str) -> DynamicImage {
    let n = digits.len() as u32;
    let width = 2 * MARGIN + n * CELL_W;
    let height = 2 * MARGIN + CELL_H;
    let cells: Vec<u8> = digits.bytes().map(|b| DIGITS[(b - b'0') as usize]).collect();

    let img: GrayImage = ImageBuffer::from_fn(width, height, |x, y| {
        if x < MARGIN || y < MARGIN || x >= width - MARGIN || y >= height - MARGIN {
            return Luma([255]);
        }
        let cell = ((x - MARGIN) / CELL_W) as usize;
        let (cx, cy) = ((x - MARGIN) % CELL_W, y - MARGIN);
        let lit = SEGMENTS.iter().enumerate().any(|(i, &(x0, y0, x1, y1))| {
            cells[cell] & (1 << i) != 0 && cx >= x0 && cx < x1 && cy >= y0 && cy < y1
        });
        Luma([if lit { 0 } else { 255 }])
    });
    DynamicImage::ImageLuma8(img)
}

fn read_segments(image: &DynamicImage) -> Result<Vec<TextObservation>, OcrError> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if height != 2 * MARGIN + CELL_H || width < 2 * MARGIN || (width - 2 * MARGIN) % CELL_W != 0 {
        return Err(OcrError::Engine(format!("unexpected geometry {width}x{height}")));
    }

    let cells = (width - 2 * MARGIN) / CELL_W;
    let text: String = (0..cells)
        .map(|cell| {
            let pattern = PROBES.iter().enumerate().fold(0u8, |acc, (i, &(px, py))| {
                let v = gray.get_pixel(MARGIN + cell * CELL_W + px, MARGIN + py)[0];
                if v < 128 { acc | (1 << i) } else { acc }
            });
            DIGITS
                .iter()
                .position(|&d| d == pattern)
                .map_or('?', |d| char::from(b'0' + d as u8))
        })
        .collect();

    if text.is_empty() {
        return Ok(Vec::new());
    }
    let bbox = BoundingBox::new(
        MARGIN as f32 / width as f32,
        MARGIN as f32 / height as f32,
        (cells * CELL_W) as f32 / width as f32,
        CELL_H as f32 / height as f32,
    );
    Ok(vec![TextObservation::new(text, 0.9).with_bounding_box(bbox)])
}

#[test]
fn reader_decodes_its_own_rendering() {
    let obs = read_segments(&render("0123456789")).unwrap();
    assert_eq!(obs[0].text, "0123456789");
}

#[tokio::test]
async fn rendered_digits_yield_a_reading() {
    let pipeline = MileagePipeline::new(FnRecognizer::new(read_segments));

    match pipeline.recognize(render("32500"), None).await {
        Ok(result) => {
            assert!(result.mileage.value() > 0);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert_eq!(result.mileage.value(), 32_500);
            assert_eq!(result.detected_unit, None);
        }
        Err(e) => assert!(e.is_user_facing(), "unexpected outcome: {e}"),
    }
}

#[tokio::test]
async fn rendered_digits_follow_the_prior() {
    let pipeline = MileagePipeline::new(FnRecognizer::new(read_segments));
    let result = pipeline.recognize(render("32500"), Some(31_000)).await.unwrap();
    assert_eq!(result.mileage.value(), 32_500);
}

#[tokio::test]
async fn blank_display_is_a_typed_failure() {
    let pipeline = MileagePipeline::new(FnRecognizer::new(|_: &DynamicImage| Ok(Vec::new())));
    let err = pipeline.recognize(render("0"), None).await.unwrap_err();
    assert_eq!(err, RecognitionError::NoTextFound);
}
