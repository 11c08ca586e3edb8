//! Rich markup rendering
//!
//! Produces a self-contained HTML document and leans on the consuming
//! viewer/print pipeline for text shaping, which is the most reliable
//! way to put Arabic on paper across printer vendors. Layout is plain
//! flex rows styled for a narrow thermal column.

use super::{RenderRequest, copy_marker};
use crate::format::{currency_label, fmt_money, fmt_quantity, fmt_timestamp};
use crate::receipt::{LineItem, OrderType, PrinterRole};
use rust_decimal::Decimal;

/// Render a receipt as an HTML document
pub fn render(req: &RenderRequest<'_>) -> String {
    let title = match req.role {
        PrinterRole::Customer => format!("Receipt #{}", req.receipt.order_number),
        PrinterRole::Kitchen => format!("Kitchen #{}", req.receipt.order_number),
    };

    let body = match req.role {
        PrinterRole::Customer => customer_body(req),
        PrinterRole::Kitchen => kitchen_body(req),
    };

    html_shell(&title, &body, req.has_bidi)
}

fn customer_body(req: &RenderRequest<'_>) -> String {
    let r = req.receipt;
    let template = req.template;
    let ar = req.has_bidi;
    let mut body = String::with_capacity(4096);

    if let Some(marker) = copy_marker(req.copy, ar) {
        body.push_str(&format!("<div class=\"copy\">{}</div>", esc(&marker)));
    }

    if let Some(logo) = &template.logo_base64 {
        body.push_str(&format!(
            "<img class=\"logo\" src=\"data:image/png;base64,{}\" alt=\"\"/>",
            logo.trim()
        ));
    }

    // Store identity, dual-rendered where localized text is configured
    body.push_str(&format!(
        "<div class=\"center\"><strong>{}</strong></div>",
        esc(&template.store_name)
    ));
    if let Some(localized) = &template.store_name_localized {
        body.push_str(&format!(
            "<div class=\"center\"><strong>{}</strong></div>",
            esc(localized)
        ));
    }
    if let Some(address) = &template.address {
        body.push_str(&format!("<div class=\"center note\">{}</div>", esc(address)));
    }
    if let Some(address) = &template.address_localized {
        body.push_str(&format!("<div class=\"center note\">{}</div>", esc(address)));
    }
    if let Some(phone) = &template.phone {
        body.push_str(&format!(
            "<div class=\"center note\">{} {}</div>",
            t(ar, "Tel:", "هاتف:"),
            esc(phone)
        ));
    }
    if let Some(tax_id) = &template.tax_id {
        body.push_str(&format!(
            "<div class=\"center note\">{} {}</div>",
            t(ar, "Tax ID:", "الرقم الضريبي:"),
            esc(tax_id)
        ));
    }

    // Order metadata
    body.push_str("<div class=\"section\">");
    body.push_str(&line(t(ar, "Order", "طلب"), &format!("#{}", esc(&r.order_number))));
    body.push_str(&line(t(ar, "Date", "التاريخ"), &fmt_timestamp(r.timestamp, ar)));
    if let Some(cashier) = cashier_name(req) {
        body.push_str(&line(t(ar, "Cashier", "الكاشير"), &esc(cashier)));
    }
    if r.order_type == OrderType::DineIn {
        if let Some(table) = &r.table_number {
            body.push_str(&line(t(ar, "Table", "طاولة"), &esc(table)));
        }
    }
    if r.order_type == OrderType::Delivery {
        if let Some(name) = &r.customer_name {
            body.push_str(&line(t(ar, "Customer", "العميل"), &esc(name)));
        }
        if let Some(phone) = &r.customer_phone {
            body.push_str(&line(t(ar, "Phone", "الهاتف"), &esc(phone)));
        }
        if let Some(address) = &r.customer_address {
            body.push_str(&line(t(ar, "Address", "العنوان"), &esc(address)));
        }
    }
    body.push_str("</div>");

    // Itemized lines
    body.push_str(&format!(
        "<div class=\"section\"><h3>{}</h3>",
        t(ar, "Items", "الأصناف")
    ));
    for item in &r.items {
        let cls = if item.cancelled { "line strike" } else { "line" };
        body.push_str(&format!(
            "<div class=\"{}\"><span>{} x {} @ {}</span><span>{}</span></div>",
            cls,
            fmt_quantity(item.quantity, ar),
            esc(display_name(item, ar)),
            fmt_money(item.unit_price, ar),
            fmt_money(item.line_total(), ar),
        ));
    }
    body.push_str("</div>");

    // Totals
    body.push_str("<div class=\"section\">");
    body.push_str(&line(
        t(ar, "Subtotal", "المجموع الفرعي"),
        &fmt_money(r.subtotal, ar),
    ));
    body.push_str(&line(t(ar, "Tax", "الضريبة"), &fmt_money(r.tax, ar)));
    if r.discount > Decimal::ZERO {
        body.push_str(&line(t(ar, "Discount", "الخصم"), &fmt_money(r.discount, ar)));
    }
    body.push_str(&format!(
        "<div class=\"line\"><strong>{}</strong><strong>{} {}</strong></div>",
        t(ar, "Total", "الإجمالي"),
        fmt_money(r.total, ar),
        esc(currency_label(template, ar)),
    ));
    body.push_str("</div>");

    // Payments, only when something other than plain cash was used
    if r.payments.iter().any(|p| p.method != "cash") {
        body.push_str(&format!(
            "<div class=\"section\"><h3>{}</h3>",
            t(ar, "Payment", "الدفع")
        ));
        for payment in &r.payments {
            body.push_str(&line(&esc(&payment.method), &fmt_money(payment.amount, ar)));
        }
        body.push_str("</div>");
    }

    // Footer
    body.push_str(&format!(
        "<div class=\"section center\">{}</div>",
        esc(&template.thank_you)
    ));
    if let Some(extra) = &template.extra_footer {
        body.push_str(&format!("<div class=\"center note\">{}</div>", esc(extra)));
    }
    if let Some(qr) = &template.qr_data {
        body.push_str(&format!("<div class=\"center note\">QR: {}</div>", esc(qr)));
    }

    body
}

fn kitchen_body(req: &RenderRequest<'_>) -> String {
    let r = req.receipt;
    let ar = req.has_bidi;
    let mut body = String::with_capacity(1024);

    if let Some(marker) = copy_marker(req.copy, ar) {
        body.push_str(&format!("<div class=\"copy\">{}</div>", esc(&marker)));
    }

    body.push_str(&format!(
        "<div class=\"center\"><strong>{}</strong></div>",
        t(ar, "KITCHEN", "المطبخ")
    ));

    if let Some(table) = &r.table_number {
        body.push_str(&format!(
            "<div class=\"callout\">{} {}</div>",
            t(ar, "TABLE", "طاولة"),
            esc(table)
        ));
    }

    body.push_str("<div class=\"section\">");
    body.push_str(&line(t(ar, "Order", "طلب"), &format!("#{}", esc(&r.order_number))));
    body.push_str(&line(t(ar, "Date", "التاريخ"), &fmt_timestamp(r.timestamp, ar)));
    body.push_str("</div>");

    // Large type, names and quantities only, no money
    body.push_str("<div class=\"section\">");
    for item in &r.items {
        let cls = if item.cancelled { "line big strike" } else { "line big" };
        body.push_str(&format!(
            "<div class=\"{}\"><span>{} x {}</span></div>",
            cls,
            fmt_quantity(item.quantity, ar),
            esc(display_name(item, ar)),
        ));
    }
    body.push_str("</div>");

    body
}

/// Pick the label matching the content script
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

fn cashier_name<'a>(req: &RenderRequest<'a>) -> Option<&'a str> {
    if req.has_bidi {
        req.receipt
            .cashier_name_localized
            .as_deref()
            .or(req.receipt.cashier_name.as_deref())
    } else {
        req.receipt.cashier_name.as_deref()
    }
}

fn line(label: &str, value: &str) -> String {
    format!("<div class=\"line\"><span>{label}</span><span>{value}</span></div>")
}

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn html_shell(title: &str, body: &str, rtl: bool) -> String {
    let (lang, dir) = if rtl { ("ar", "rtl") } else { ("en", "ltr") };
    format!(
        r#"<!DOCTYPE html>
<html lang="{}" dir="{}">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
body {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; margin: 0; padding: 12px; background: #fff; color: #111; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; font-size: 10px; }}
.line strong {{ font-size: 11px; }}
.line.big {{ font-size: 14px; font-weight: 700; }}
.section {{ margin-top: 8px; border-top: 1px dashed #111; padding-top: 6px; }}
.section h3 {{ margin: 0 0 4px 0; font-size: 11px; text-transform: uppercase; }}
.note {{ color: #666; font-size: 9px; }}
.center {{ text-align: center; }}
.strike {{ text-decoration: line-through; color: #666; }}
.copy {{ text-align: center; font-weight: 700; font-size: 12px; border: 1px solid #111; padding: 2px; margin-bottom: 6px; }}
.callout {{ text-align: center; font-weight: 800; font-size: 20px; border: 2px solid #111; padding: 4px; margin-top: 6px; }}
.logo {{ display: block; max-width: 60%; margin: 0 auto 6px auto; }}
</style>
</head>
<body>{}</body>
</html>"#,
        lang,
        dir,
        esc(title),
        body
    )
}
