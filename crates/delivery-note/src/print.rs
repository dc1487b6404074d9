//! Print-ready HTML page for a delivery note

use crate::schema::DeliveryNote;
use cn_text::format_iso_date;

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
@page {{ size: A4; margin: 10mm; }}
body {{ font-family: "Microsoft YaHei", "PingFang SC", "Noto Sans CJK SC", sans-serif; margin: 0; color: #111; font-size: 12px; }}
.header {{ position: relative; text-align: center; border-bottom: 2px solid #333; padding-bottom: 8px; margin-bottom: 14px; }}
.logo {{ position: absolute; left: 0; top: 0; max-height: 48px; max-width: 120px; }}
.title {{ font-size: 24px; font-weight: bold; letter-spacing: 8px; margin: 0; }}
.company {{ color: #666; font-size: 12px; margin-top: 4px; }}
.number {{ position: absolute; right: 0; top: 10px; font-size: 11px; }}
.info {{ display: flex; flex-wrap: wrap; gap: 8px 24px; margin-bottom: 12px; }}
.field {{ flex: 1 1 40%; }}
.field.wide {{ flex-basis: 100%; }}
.label {{ color: #666; }}
.value {{ border-bottom: 1px solid #999; padding: 0 4px; display: inline-block; min-width: 60%; }}
table {{ width: 100%; border-collapse: collapse; table-layout: fixed; }}
th, td {{ border: 1px solid #333; padding: 4px; text-align: center; word-break: break-all; }}
th {{ background: #f5f5f5; }}
thead {{ display: table-header-group; }}
tr {{ page-break-inside: avoid; }}
.summary {{ margin-top: 12px; padding: 8px 12px; background: #fafafa; border: 1px solid #e5e5e5; text-align: right; page-break-inside: avoid; }}
.summary div {{ margin: 3px 0; }}
.summary .grand {{ font-weight: bold; font-size: 14px; border-top: 1px solid #ddd; padding-top: 4px; }}
.summary .words {{ font-weight: bold; }}
.signatures {{ display: flex; flex-wrap: wrap; gap: 16px 24px; margin-top: 28px; page-break-inside: avoid; }}
.signatures .field {{ flex: 1 1 28%; }}
</style>
</head>
<body>{}</body>
</html>"#,
        escape_html(title),
        body
    )
}

fn field(label: &str, value: &str, class: &str) -> String {
    format!(
        "<div class=\"{class}\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>",
        escape_html(label),
        escape_html(value)
    )
}

/// Render a standalone A4 HTML page with the same sections as the PDF
pub fn render_print_html(note: &DeliveryNote) -> String {
    let summary = note.totals().summary();
    let form = &note.form_data;
    let mut body = String::new();

    body.push_str("<div class=\"header\">");
    if let Some(logo) = note
        .settings
        .logo
        .as_deref()
        .filter(|url| url.starts_with("data:image/"))
    {
        body.push_str(&format!("<img class=\"logo\" src=\"{}\" alt=\"\"/>", escape_html(logo)));
    }
    body.push_str(&format!("<h1 class=\"title\">{}</h1>", escape_html(note.title())));
    let company = note.settings.company_name.trim();
    if !company.is_empty() {
        body.push_str(&format!("<div class=\"company\">{}</div>", escape_html(company)));
    }
    body.push_str(&format!(
        "<div class=\"number\">编号：{}</div></div>",
        escape_html(&note.note_number)
    ));

    let date = format_iso_date(&form.delivery_date).unwrap_or_else(|_| form.delivery_date.clone());
    body.push_str("<div class=\"info\">");
    body.push_str(&field("客户名称：", &form.customer_name, "field"));
    body.push_str(&field("送货日期：", &date, "field"));
    body.push_str(&field("送货地址：", &form.delivery_address, "field wide"));
    body.push_str("</div>");

    body.push_str(
        "<table><colgroup><col style=\"width:6%\"/><col style=\"width:22%\"/>\
         <col style=\"width:14%\"/><col style=\"width:8%\"/><col style=\"width:10%\"/>\
         <col style=\"width:12%\"/><col style=\"width:13%\"/><col style=\"width:15%\"/></colgroup>\
         <thead><tr><th>序号</th><th>产品名称</th><th>规格</th><th>单位</th><th>数量</th>\
         <th>单价</th><th>金额</th><th>备注</th></tr></thead><tbody>",
    );
    for (index, item) in note.items.iter().enumerate() {
        let amount = summary.row_amounts.get(index).map(String::as_str).unwrap_or_default();
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            index + 1,
            escape_html(&item.name),
            escape_html(&item.spec),
            escape_html(&item.unit),
            escape_html(item.quantity.trim()),
            escape_html(item.price.trim()),
            amount,
            escape_html(&item.remark)
        ));
    }
    body.push_str("</tbody></table>");

    body.push_str(&format!(
        "<div class=\"summary\"><div>合计金额：{}</div><div>税率：{}</div><div>税额：{}</div>\
         <div class=\"grand\">价税合计：{}</div><div class=\"words\">大写金额：{}</div></div>",
        escape_html(&summary.subtotal),
        escape_html(&summary.tax_rate),
        escape_html(&summary.tax_amount),
        escape_html(&summary.grand_total),
        escape_html(&summary.amount_in_words)
    ));

    body.push_str("<div class=\"signatures\">");
    body.push_str(&field("制单人：", &form.maker, "field"));
    body.push_str(&field("拣货人：", &form.picker, "field"));
    body.push_str(&field("审核人：", &form.reviewer, "field"));
    body.push_str(&field("客户签收：", "", "field wide"));
    body.push_str("</div>");

    html_shell(note.title(), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FormData, LineItem, Settings};
    use pretty_assertions::assert_eq;

    fn note() -> DeliveryNote {
        DeliveryNote {
            settings: Settings {
                company_name: "华东物流".to_string(),
                ..Settings::default()
            },
            form_data: FormData {
                customer_name: "<script>alert(1)</script>".to_string(),
                delivery_date: "2026-10-19".to_string(),
                maker: "李四".to_string(),
                ..FormData::default()
            },
            items: vec![LineItem {
                seq: 1,
                name: "螺丝 & 螺母".to_string(),
                quantity: "2".to_string(),
                price: "50".to_string(),
                ..LineItem::default()
            }],
            note_number: "20261019093000001".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_page_setup_and_sections() {
        let html = render_print_html(&note());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@page { size: A4; margin: 10mm; }"));
        assert!(html.contains("<title>出库单</title>"));
        assert!(html.contains("编号：20261019093000001"));
        assert!(html.contains("2026年10月19日"));
        assert!(html.contains("<td>100.00</td>"));
        assert!(html.contains("价税合计：¥113.00"));
        assert!(html.contains("大写金额：壹佰壹拾叁元整"));
        assert!(html.contains("客户签收："));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let html = render_print_html(&note());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("螺丝 &amp; 螺母"));
    }

    #[test]
    fn test_logo_only_for_image_data_urls() {
        let mut with_logo = note();
        with_logo.settings.logo = Some("data:image/png;base64,AAAA".to_string());
        assert!(render_print_html(&with_logo).contains("<img class=\"logo\" src=\"data:image/png;base64,AAAA\""));

        with_logo.settings.logo = Some("javascript:alert(1)".to_string());
        assert!(!render_print_html(&with_logo).contains("<img"));
    }
}
