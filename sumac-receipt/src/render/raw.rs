//! Raw ESC/POS rendering
//!
//! Last-resort path for text-only legacy devices. Text goes out in
//! Windows-1256, so Arabic letters survive but arrive unshaped and in
//! logical order, and Arabic-Indic digits have no code points at all.
//! Numerals therefore always stay ASCII here; labels and item names
//! still follow the content language.

use super::{RenderRequest, copy_marker};
use crate::format::{currency_label, fmt_money, fmt_quantity, fmt_timestamp};
use crate::receipt::{LineItem, OrderType, PrinterRole, Receipt};
use rust_decimal::Decimal;
use sumac_printer::{EscPosBuilder, pad_width, process_logo_base64};
use tracing::warn;

/// Render a receipt into a ready-to-send ESC/POS byte stream
pub fn render(req: &RenderRequest<'_>) -> Vec<u8> {
    let mut b = EscPosBuilder::new(req.paper.columns);
    match req.role {
        PrinterRole::Customer => customer_stream(&mut b, req),
        PrinterRole::Kitchen => kitchen_stream(&mut b, req),
    }
    b.build()
}

fn customer_stream(b: &mut EscPosBuilder, req: &RenderRequest<'_>) {
    let r = req.receipt;
    let template = req.template;
    let ar = req.has_bidi;

    if let Some(encoded) = &template.logo_base64 {
        match process_logo_base64(encoded, req.paper.dots_per_line) {
            Some(bytes) => {
                b.raw(&bytes);
            }
            None => warn!("logo could not be decoded, printing without it"),
        }
    }

    if let Some(marker) = copy_marker(req.copy, ar) {
        b.center().bold().double_size().line(&marker).reset_size().bold_off().newline();
    }

    b.center().bold().double_size().line(&template.store_name).reset_size().bold_off();
    if ar {
        if let Some(localized) = &template.store_name_localized {
            b.bold().line(localized).bold_off();
        }
    }
    if let Some(address) = &template.address {
        b.line(address);
    }
    if let Some(phone) = &template.phone {
        b.line(phone);
    }
    if let Some(tax_id) = &template.tax_id {
        b.line(tax_id);
    }
    b.left().sep_double();

    b.line_lr(t(ar, "Order", "طلب"), &format!("#{}", r.order_number));
    b.line_lr(t(ar, "Date", "التاريخ"), &fmt_timestamp(r.timestamp, false));
    if let Some(cashier) = cashier_name(r, ar) {
        b.line_lr(t(ar, "Cashier", "الكاشير"), cashier);
    }
    if r.order_type == OrderType::DineIn {
        if let Some(table) = &r.table_number {
            b.line_lr(t(ar, "Table", "طاولة"), table);
        }
    }
    if r.order_type == OrderType::Delivery {
        if let Some(name) = &r.customer_name {
            b.line_lr(t(ar, "Customer", "العميل"), name);
        }
        if let Some(phone) = &r.customer_phone {
            b.line_lr(t(ar, "Phone", "الهاتف"), phone);
        }
        if let Some(address) = &r.customer_address {
            b.line(address);
        }
    }
    b.sep_single();

    // Columns: qty 3 | name | unit price 8 | line total 10
    let name_w = req.paper.columns.saturating_sub(24);
    b.line(&format!(
        "{} {} {} {}",
        pad_width(t(ar, "QTY", "عدد"), 3, true),
        pad_width(t(ar, "ITEM", "الصنف"), name_w, false),
        pad_width(t(ar, "PRICE", "سعر"), 8, true),
        pad_width(t(ar, "TOTAL", "إجمالي"), 10, true),
    ));
    b.sep_single();
    for item in r.items.iter().filter(|i| !i.cancelled) {
        b.line(&format!(
            "{} {} {} {}",
            pad_width(&fmt_quantity(item.quantity, false), 3, true),
            pad_width(display_name(item, ar), name_w, false),
            pad_width(&fmt_money(item.unit_price, false), 8, true),
            pad_width(&fmt_money(item.line_total(), false), 10, true),
        ));
    }
    b.sep_single();

    b.line_lr(t(ar, "Subtotal", "المجموع الفرعي"), &fmt_money(r.subtotal, false));
    b.line_lr(t(ar, "Tax", "الضريبة"), &fmt_money(r.tax, false));
    if r.discount > Decimal::ZERO {
        b.line_lr(t(ar, "Discount", "الخصم"), &fmt_money(r.discount, false));
    }
    b.bold().double_height();
    b.line_lr(
        t(ar, "Total", "الإجمالي"),
        &format!("{} {}", fmt_money(r.total, false), currency_label(template, ar)),
    );
    b.reset_size().bold_off();

    if r.payments.iter().any(|p| p.method != "cash") {
        b.sep_single();
        for payment in &r.payments {
            b.line_lr(&payment.method, &fmt_money(payment.amount, false));
        }
    }

    b.newline().center().line(&template.thank_you);
    if let Some(extra) = &template.extra_footer {
        b.line(extra);
    }
    if let Some(qr) = &template.qr_data {
        b.newline().qr_code(qr, 6);
    }

    // The kick pulse must not repeat on reprints
    if template.kick_drawer && !req.copy.is_copy && r.payments.iter().any(|p| p.method == "cash") {
        b.open_drawer();
    }

    b.cut_feed(3);
}

fn kitchen_stream(b: &mut EscPosBuilder, req: &RenderRequest<'_>) {
    let r = req.receipt;
    let ar = req.has_bidi;

    if let Some(marker) = copy_marker(req.copy, ar) {
        b.center().bold().double_size().line(&marker).reset_size().bold_off().newline();
    }

    b.center().bold().double_size().line(t(ar, "KITCHEN", "المطبخ"));
    if let Some(table) = &r.table_number {
        b.line(&format!("{} {}", t(ar, "TABLE", "طاولة"), table));
    }
    b.reset_size().bold_off().left();
    b.line_lr(&format!("#{}", r.order_number), &fmt_timestamp(r.timestamp, false));
    b.sep_double();

    b.double_height();
    for item in r.items.iter().filter(|i| !i.cancelled) {
        b.line(&format!(
            "{} x {}",
            fmt_quantity(item.quantity, false),
            display_name(item, ar)
        ));
    }
    b.reset_size();

    b.cut_feed(3);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PaperSpec, ReceiptTemplate};
    use crate::receipt::ReceiptInput;
    use crate::render::CopyInfo;
    use serde_json::json;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn tea_receipt(payment_method: &str) -> Receipt {
        serde_json::from_value::<ReceiptInput>(json!({
            "orderNumber": "1001",
            "orderItems": [{"name": "Tea", "quantity": 3, "price": 5.00}],
            "tax": 1.5,
            "payments": [{"method": payment_method, "amount": 16.5}]
        }))
        .unwrap()
        .normalize()
    }

    fn request<'a>(
        receipt: &'a Receipt,
        template: &'a ReceiptTemplate,
        role: PrinterRole,
        has_bidi: bool,
        copy: CopyInfo,
    ) -> RenderRequest<'a> {
        RenderRequest {
            receipt,
            template,
            role,
            paper: PaperSpec::mm80(),
            has_bidi,
            copy,
        }
    }

    const DRAWER_KICK: &[u8] = &[0x1B, 0x70, 0x00, 25, 250];

    #[test]
    fn test_customer_stream() {
        let receipt = tea_receipt("card");
        let template = ReceiptTemplate {
            store_name: "Sumac House".to_string(),
            ..ReceiptTemplate::default()
        };
        let data = render(&request(
            &receipt,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::original(),
        ));

        // Code page selected before anything else
        assert_eq!(&data[..3], &[0x1B, 0x74, 50]);
        assert!(contains(&data, b"Sumac House"));
        // Item row: right-aligned qty, name column, unit price, line total
        assert!(contains(&data, b"QTY"));
        assert!(contains(&data, b"  3 Tea"));
        assert!(contains(&data, b"5.00"));
        assert!(contains(&data, b"15.00"));
        assert!(contains(&data, b"16.50 SAR"));
        // GS V 66 cut at the end
        assert!(contains(&data, &[0x1D, 0x56, 0x42, 3]));
    }

    #[test]
    fn test_cash_payment_kicks_drawer() {
        let template = ReceiptTemplate::default();

        let cash = tea_receipt("cash");
        let data = render(&request(
            &cash,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::original(),
        ));
        assert!(contains(&data, DRAWER_KICK));

        let card = tea_receipt("card");
        let data = render(&request(
            &card,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::original(),
        ));
        assert!(!contains(&data, DRAWER_KICK));
    }

    #[test]
    fn test_drawer_disabled_in_template() {
        let template = ReceiptTemplate {
            kick_drawer: false,
            ..ReceiptTemplate::default()
        };

        let cash = tea_receipt("cash");
        let data = render(&request(
            &cash,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::original(),
        ));
        assert!(!contains(&data, DRAWER_KICK));
    }

    #[test]
    fn test_reprint_stamped_and_no_drawer() {
        let receipt = tea_receipt("cash");
        let template = ReceiptTemplate::default();
        let data = render(&request(
            &receipt,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::reprint(1),
        ));

        assert!(contains(&data, b"*** COPY #1 ***"));
        assert!(!contains(&data, DRAWER_KICK));
    }

    #[test]
    fn test_kitchen_has_no_prices() {
        let receipt = tea_receipt("cash");
        let template = ReceiptTemplate::default();
        let data = render(&request(
            &receipt,
            &template,
            PrinterRole::Kitchen,
            false,
            CopyInfo::original(),
        ));

        assert!(contains(&data, b"KITCHEN"));
        assert!(contains(&data, b"3 x Tea"));
        assert!(!contains(&data, b"16.50"));
        assert!(!contains(&data, DRAWER_KICK));
    }

    #[test]
    fn test_bidi_keeps_ascii_digits() {
        let receipt = tea_receipt("card");
        let template = ReceiptTemplate::default();
        let data = render(&request(
            &receipt,
            &template,
            PrinterRole::Customer,
            true,
            CopyInfo::original(),
        ));

        // Arabic labels replace the English ones, numerals stay ASCII
        assert!(!contains(&data, b"Total"));
        assert!(contains(&data, b"16.50"));
    }

    #[test]
    fn test_qr_code_when_configured() {
        let receipt = tea_receipt("card");
        let template = ReceiptTemplate {
            qr_data: Some("https://sumac.example/r/1001".to_string()),
            ..ReceiptTemplate::default()
        };
        let data = render(&request(
            &receipt,
            &template,
            PrinterRole::Customer,
            false,
            CopyInfo::original(),
        ));

        // QR store-data function header followed by the payload
        assert!(contains(&data, &[0x31, 0x50, 0x30]));
        assert!(contains(&data, b"https://sumac.example/r/1001"));
    }
}
