//! Rasterized rendering
//!
//! Draws the receipt into a 1-bit bitmap, which guarantees visual
//! fidelity on any graphics-capable device at the cost of shipping an
//! image. Arabic text is shaped in-process (positional forms + RTL
//! reordering) before glyph drawing, since no firmware is involved.
//!
//! Two font sources: a TTF loaded at startup (required for Arabic
//! glyphs) and a built-in 8x8 bitmap font that covers ASCII and keeps
//! the path usable without font assets.

use super::{RasterImage, RenderRequest, copy_marker};
use crate::error::{EngineError, EngineResult};
use crate::format::{currency_label, fmt_money, fmt_quantity, fmt_timestamp};
use crate::receipt::{LineItem, OrderType, PrinterRole, Receipt};
use crate::shape::shape_line;
use font8x8::legacy::BASIC_LEGACY;
use image::{GrayImage, Luma};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::warn;

/// Glyph source for bitmap drawing
pub enum RasterFont {
    /// 8x8 bitmap font, ASCII coverage only
    Builtin,
    /// Proportional TrueType font (needed for Arabic glyphs)
    Ttf(rusttype::Font<'static>),
}

impl RasterFont {
    pub fn builtin() -> Self {
        RasterFont::Builtin
    }

    pub fn from_bytes(bytes: Vec<u8>) -> EngineResult<Self> {
        rusttype::Font::try_from_vec(bytes)
            .map(RasterFont::Ttf)
            .ok_or_else(|| EngineError::Render("font data is not a usable TrueType font".into()))
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Size {
    Normal,
    Double,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

/// One planned output line, prior to pixel drawing
enum Line {
    Text {
        text: String,
        size: Size,
        align: Align,
    },
    /// Label at the left edge, value at the right edge
    Pair {
        left: String,
        right: String,
        size: Size,
    },
    Rule,
    Blank,
}

impl Line {
    fn text(text: impl Into<String>, size: Size, align: Align) -> Self {
        Line::Text {
            text: text.into(),
            size,
            align,
        }
    }

    fn pair(left: impl Into<String>, right: impl Into<String>, size: Size) -> Self {
        Line::Pair {
            left: left.into(),
            right: right.into(),
            size,
        }
    }
}

/// Render a receipt into a packed 1-bit raster image
pub fn render(req: &RenderRequest<'_>, font: Option<&RasterFont>) -> EngineResult<RasterImage> {
    let builtin = RasterFont::Builtin;
    let font = font.unwrap_or(&builtin);

    if req.has_bidi && matches!(font, RasterFont::Builtin) {
        warn!("rasterizing Arabic content with the builtin ASCII font, glyphs will degrade");
    }

    let plan = match req.role {
        PrinterRole::Customer => customer_plan(req),
        PrinterRole::Kitchen => kitchen_plan(req),
    };

    let width = req.paper.dots_per_line;
    let height: u32 = plan.iter().map(|l| line_height(l, font)).sum::<u32>() + PADDING * 2;

    let mut canvas = GrayImage::from_pixel(width, height, Luma([255u8]));
    let mut y = PADDING;
    for line in &plan {
        draw_line(&mut canvas, line, font, width, y);
        y += line_height(line, font);
    }

    Ok(pack(&canvas))
}

// ============================================================================
// Line plans
// ============================================================================

fn customer_plan(req: &RenderRequest<'_>) -> Vec<Line> {
    let r = req.receipt;
    let template = req.template;
    let ar = req.has_bidi;
    let mut plan = Vec::with_capacity(r.items.len() + 16);

    if let Some(marker) = copy_marker(req.copy, ar) {
        plan.push(Line::text(marker, Size::Double, Align::Center));
        plan.push(Line::Blank);
    }

    plan.push(Line::text(&template.store_name, Size::Double, Align::Center));
    if let Some(localized) = &template.store_name_localized {
        plan.push(Line::text(localized, Size::Double, Align::Center));
    }
    if let Some(address) = &template.address {
        plan.push(Line::text(address, Size::Normal, Align::Center));
    }
    if let Some(phone) = &template.phone {
        plan.push(Line::text(phone, Size::Normal, Align::Center));
    }
    if let Some(tax_id) = &template.tax_id {
        plan.push(Line::text(tax_id, Size::Normal, Align::Center));
    }
    plan.push(Line::Rule);

    plan.push(Line::pair(
        t(ar, "Order", "طلب"),
        format!("#{}", r.order_number),
        Size::Normal,
    ));
    plan.push(Line::pair(
        t(ar, "Date", "التاريخ"),
        fmt_timestamp(r.timestamp, ar),
        Size::Normal,
    ));
    if let Some(cashier) = cashier_name(r, ar) {
        plan.push(Line::pair(t(ar, "Cashier", "الكاشير"), cashier, Size::Normal));
    }
    if r.order_type == OrderType::DineIn {
        if let Some(table) = &r.table_number {
            plan.push(Line::pair(t(ar, "Table", "طاولة"), table, Size::Normal));
        }
    }
    if r.order_type == OrderType::Delivery {
        if let Some(phone) = &r.customer_phone {
            plan.push(Line::pair(t(ar, "Phone", "الهاتف"), phone, Size::Normal));
        }
    }
    plan.push(Line::Rule);

    for item in &r.items {
        if item.cancelled {
            continue;
        }
        plan.push(Line::pair(
            format!(
                "{} x {} @ {}",
                fmt_quantity(item.quantity, ar),
                display_name(item, ar),
                fmt_money(item.unit_price, ar)
            ),
            fmt_money(item.line_total(), ar),
            Size::Normal,
        ));
    }
    plan.push(Line::Rule);

    plan.push(Line::pair(
        t(ar, "Subtotal", "المجموع الفرعي"),
        fmt_money(r.subtotal, ar),
        Size::Normal,
    ));
    plan.push(Line::pair(
        t(ar, "Tax", "الضريبة"),
        fmt_money(r.tax, ar),
        Size::Normal,
    ));
    if r.discount > Decimal::ZERO {
        plan.push(Line::pair(
            t(ar, "Discount", "الخصم"),
            fmt_money(r.discount, ar),
            Size::Normal,
        ));
    }
    plan.push(Line::pair(
        t(ar, "Total", "الإجمالي"),
        format!("{} {}", fmt_money(r.total, ar), currency_label(template, ar)),
        Size::Double,
    ));

    plan.push(Line::Blank);
    plan.push(Line::text(&template.thank_you, Size::Normal, Align::Center));
    if let Some(extra) = &template.extra_footer {
        plan.push(Line::text(extra, Size::Normal, Align::Center));
    }

    plan
}

fn kitchen_plan(req: &RenderRequest<'_>) -> Vec<Line> {
    let r = req.receipt;
    let ar = req.has_bidi;
    let mut plan = Vec::with_capacity(r.items.len() + 8);

    if let Some(marker) = copy_marker(req.copy, ar) {
        plan.push(Line::text(marker, Size::Double, Align::Center));
        plan.push(Line::Blank);
    }

    plan.push(Line::text(t(ar, "KITCHEN", "المطبخ"), Size::Double, Align::Center));
    if let Some(table) = &r.table_number {
        plan.push(Line::text(
            format!("{} {}", t(ar, "TABLE", "طاولة"), table),
            Size::Double,
            Align::Center,
        ));
    }
    plan.push(Line::pair(
        format!("#{}", r.order_number),
        fmt_timestamp(r.timestamp, ar),
        Size::Normal,
    ));
    plan.push(Line::Rule);

    for item in &r.items {
        if item.cancelled {
            continue;
        }
        plan.push(Line::text(
            format!(
                "{} x {}",
                fmt_quantity(item.quantity, ar),
                display_name(item, ar)
            ),
            Size::Double,
            Align::Left,
        ));
    }

    plan
}

fn t<'a>(arabic: bool, en: &'a str, ar: &'a str) -> &'a str {
    if arabic { ar } else { en }
}

fn display_name(item: &LineItem, arabic: bool) -> &str {
    if arabic {
        item.localized_name.as_deref().unwrap_or(&item.name)
    } else {
        &item.name
    }
}

fn cashier_name(r: &Receipt, arabic: bool) -> Option<&str> {
    if arabic {
        r.cashier_name_localized
            .as_deref()
            .or(r.cashier_name.as_deref())
    } else {
        r.cashier_name.as_deref()
    }
}

// ============================================================================
// Pixel drawing
// ============================================================================

const PADDING: u32 = 8;
const BUILTIN_GLYPH: u32 = 8;

fn px_size(size: Size) -> f32 {
    match size {
        Size::Normal => 20.0,
        Size::Double => 40.0,
    }
}

fn builtin_scale(size: Size) -> u32 {
    match size {
        Size::Normal => 2,
        Size::Double => 4,
    }
}

fn line_height(line: &Line, font: &RasterFont) -> u32 {
    match line {
        Line::Rule => 5,
        Line::Blank => 10,
        Line::Text { size, .. } | Line::Pair { size, .. } => match font {
            RasterFont::Builtin => BUILTIN_GLYPH * builtin_scale(*size) + 4,
            RasterFont::Ttf(_) => px_size(*size) as u32 + 4,
        },
    }
}

fn measure(text: &str, size: Size, font: &RasterFont) -> u32 {
    match font {
        RasterFont::Builtin => text.chars().count() as u32 * BUILTIN_GLYPH * builtin_scale(size),
        RasterFont::Ttf(f) => {
            let scale = rusttype::Scale::uniform(px_size(size));
            f.layout(text, scale, rusttype::point(0.0, 0.0))
                .last()
                .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as u32)
                .unwrap_or(0)
        }
    }
}

fn draw_line(canvas: &mut GrayImage, line: &Line, font: &RasterFont, width: u32, y: u32) {
    match line {
        Line::Blank => {}
        Line::Rule => {
            let ry = y + 2;
            for x in 0..width {
                put_black(canvas, x, ry);
            }
        }
        Line::Text { text, size, align } => {
            let shaped = shape_line(text);
            let text_width = measure(&shaped, *size, font).min(width);
            let x = match align {
                Align::Left => 0,
                Align::Center => (width - text_width) / 2,
                Align::Right => width - text_width,
            };
            draw_text(canvas, &shaped, font, *size, x, y);
        }
        Line::Pair { left, right, size } => {
            let left_shaped = shape_line(left);
            let right_shaped = shape_line(right);
            let right_width = measure(&right_shaped, *size, font).min(width);
            draw_text(canvas, &left_shaped, font, *size, 0, y);
            draw_text(canvas, &right_shaped, font, *size, width - right_width, y);
        }
    }
}

fn draw_text(canvas: &mut GrayImage, text: &str, font: &RasterFont, size: Size, x: u32, y: u32) {
    match font {
        RasterFont::Builtin => draw_text_builtin(canvas, text, builtin_scale(size), x, y),
        RasterFont::Ttf(f) => draw_text_ttf(canvas, text, f, px_size(size), x, y),
    }
}

fn draw_text_builtin(canvas: &mut GrayImage, text: &str, scale: u32, x: u32, y: u32) {
    let mut pen_x = x;
    for c in text.chars() {
        // Out-of-range chars draw as '?' boxes
        let glyph = if (c as usize) < BASIC_LEGACY.len() {
            BASIC_LEGACY[c as usize]
        } else {
            BASIC_LEGACY[b'?' as usize]
        };
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                // LSB is the leftmost pixel
                if bits & (1 << col) != 0 {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            put_black(
                                canvas,
                                pen_x + col * scale + dx,
                                y + row as u32 * scale + dy,
                            );
                        }
                    }
                }
            }
        }
        pen_x += BUILTIN_GLYPH * scale;
    }
}

fn draw_text_ttf(canvas: &mut GrayImage, text: &str, font: &rusttype::Font<'_>, px: f32, x: u32, y: u32) {
    let scale = rusttype::Scale::uniform(px);
    let ascent = font.v_metrics(scale).ascent;
    for glyph in font.layout(text, scale, rusttype::point(x as f32, y as f32 + ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                if coverage > 0.5 {
                    let cx = bb.min.x + gx as i32;
                    let cy = bb.min.y + gy as i32;
                    if cx >= 0 && cy >= 0 {
                        put_black(canvas, cx as u32, cy as u32);
                    }
                }
            });
        }
    }
}

fn put_black(canvas: &mut GrayImage, x: u32, y: u32) {
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, Luma([0u8]));
    }
}

/// Pack the grayscale canvas into 1-bit rows, MSB first
fn pack(canvas: &GrayImage) -> RasterImage {
    let width = canvas.width();
    let height = canvas.height();
    let bytes_per_row = width.div_ceil(8) as usize;
    let mut rows = vec![0u8; bytes_per_row * height as usize];

    for y in 0..height {
        for x in 0..width {
            if canvas.get_pixel(x, y).0[0] < 128 {
                rows[y as usize * bytes_per_row + (x / 8) as usize] |= 0x80 >> (x % 8);
            }
        }
    }

    RasterImage {
        width,
        height,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PaperSpec, ReceiptTemplate};
    use crate::receipt::{Receipt, ReceiptInput};
    use crate::render::CopyInfo;
    use serde_json::json;

    fn tea_receipt() -> Receipt {
        serde_json::from_value::<ReceiptInput>(json!({
            "orderNumber": "1001",
            "orderItems": [{"name": "Tea", "quantity": 3, "price": 5.00}],
            "tax": 1.5
        }))
        .unwrap()
        .normalize()
    }

    fn request<'a>(
        receipt: &'a Receipt,
        template: &'a ReceiptTemplate,
        role: PrinterRole,
        copy: CopyInfo,
    ) -> RenderRequest<'a> {
        RenderRequest {
            receipt,
            template,
            role,
            paper: PaperSpec::mm80(),
            has_bidi: false,
            copy,
        }
    }

    #[test]
    fn test_raster_dimensions() {
        let receipt = tea_receipt();
        let template = ReceiptTemplate::default();
        let img = render(
            &request(&receipt, &template, PrinterRole::Customer, CopyInfo::original()),
            None,
        )
        .unwrap();

        assert_eq!(img.width, 576);
        assert!(img.height > 0);
        assert_eq!(img.rows.len(), img.bytes_per_row() * img.height as usize);
    }

    #[test]
    fn test_raster_has_ink() {
        let receipt = tea_receipt();
        let template = ReceiptTemplate::default();
        let img = render(
            &request(&receipt, &template, PrinterRole::Customer, CopyInfo::original()),
            None,
        )
        .unwrap();
        assert!(img.rows.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_copy_stamp_adds_height() {
        let receipt = tea_receipt();
        let template = ReceiptTemplate::default();
        let plain = render(
            &request(&receipt, &template, PrinterRole::Customer, CopyInfo::original()),
            None,
        )
        .unwrap();
        let copy = render(
            &request(&receipt, &template, PrinterRole::Customer, CopyInfo::reprint(1)),
            None,
        )
        .unwrap();
        assert!(copy.height > plain.height);
    }

    #[test]
    fn test_kitchen_narrow_paper() {
        let mut receipt = tea_receipt();
        receipt.table_number = Some("12".to_string());
        let template = ReceiptTemplate::default();
        let mut req = request(&receipt, &template, PrinterRole::Kitchen, CopyInfo::original());
        req.paper = PaperSpec::mm58();

        let img = render(&req, None).unwrap();
        assert_eq!(img.width, 384);
    }

    #[test]
    fn test_builtin_measure() {
        assert_eq!(measure("Tea", Size::Normal, &RasterFont::Builtin), 3 * 8 * 2);
        assert_eq!(measure("Tea", Size::Double, &RasterFont::Builtin), 3 * 8 * 4);
    }

    #[test]
    fn test_pack_sets_msb_first() {
        let mut canvas = GrayImage::from_pixel(16, 1, Luma([255u8]));
        canvas.put_pixel(0, 0, Luma([0u8]));
        canvas.put_pixel(9, 0, Luma([0u8]));
        let img = pack(&canvas);
        assert_eq!(img.rows, vec![0b1000_0000, 0b0100_0000]);
    }
}
