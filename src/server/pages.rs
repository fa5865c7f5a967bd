//! HTML pages: the login form and the gallery grid.
//!
//! Pages are rendered with `format!` into self-contained documents (inline CSS,
//! a few lines of inline script for the full-size modal). Every value that
//! originates from the bucket or the request is escaped.

use crate::gallery::{GalleryImage, GalleryPage, Pagination};

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

const BASE_STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            background: #0f0f0f;
            color: #e5e5e5;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
        }
        a { color: #60a5fa; text-decoration: none; }
"#;

/// Render the login page.
///
/// `next` is carried through the form action so a successful login lands on
/// the page that triggered it.
pub fn login_page_html(error: Option<&str>, next: Option<&str>) -> String {
    let action = match next {
        Some(next) => format!("/login?next={}", urlencoding::encode(next)),
        None => "/login".to_string(),
    };
    let action = html_escape(&action);

    let error_html = error
        .map(|e| format!(r#"<div class="error">{}</div>"#, html_escape(e)))
        .unwrap_or_default();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Gallery - Sign in</title>
    <style>{BASE_STYLE}
        .login {{
            max-width: 360px;
            margin: 15vh auto 0;
            padding: 32px;
            background: #1a1a1a;
            border-radius: 12px;
        }}
        h1 {{ font-size: 20px; margin-bottom: 24px; }}
        input {{
            width: 100%;
            padding: 10px 12px;
            margin-bottom: 16px;
            border: 1px solid #333;
            border-radius: 6px;
            background: #0f0f0f;
            color: inherit;
        }}
        button {{
            width: 100%;
            padding: 10px;
            border: 0;
            border-radius: 6px;
            background: #2563eb;
            color: #fff;
            cursor: pointer;
        }}
        .error {{
            margin-bottom: 16px;
            padding: 10px 12px;
            border-radius: 6px;
            background: #7f1d1d;
            color: #fecaca;
        }}
    </style>
</head>
<body>
    <form class="login" method="post" action="{action}">
        <h1>Image Gallery</h1>
        {error_html}
        <input type="password" name="password" placeholder="Password" autofocus required>
        <button type="submit">Sign in</button>
    </form>
</body>
</html>"##
    )
}

fn image_card(image: &GalleryImage) -> String {
    let name = html_escape(&image.name);
    let full_url = html_escape(&format!("/api/image/{}", crate::storage::encode_key(&image.name)));

    let preview = match &image.thumbnail {
        Some(data_uri) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            html_escape(data_uri),
            name
        ),
        None => r#"<div class="missing">No preview</div>"#.to_string(),
    };

    format!(
        r#"<figure class="card" data-full="{full_url}" data-name="{name}">
            {preview}
            <figcaption>{name}</figcaption>
        </figure>"#
    )
}

fn pagination_nav(pagination: &Pagination) -> String {
    let prev = if pagination.has_prev {
        format!(
            r#"<a href="/?page={}">&larr; Previous</a>"#,
            pagination.current_page - 1
        )
    } else {
        r#"<span class="disabled">&larr; Previous</span>"#.to_string()
    };

    let next = if pagination.has_next {
        format!(
            r#"<a href="/?page={}">Next &rarr;</a>"#,
            pagination.current_page + 1
        )
    } else {
        r#"<span class="disabled">Next &rarr;</span>"#.to_string()
    };

    format!(
        r#"<nav class="pager">{prev}<span>Page {} of {} &middot; {} images</span>{next}</nav>"#,
        pagination.current_page,
        pagination.total_pages.max(1),
        pagination.total_images
    )
}

/// Render the gallery page for one page of images.
pub fn gallery_page_html(page: &GalleryPage) -> String {
    let cards = if page.images.is_empty() {
        r#"<p class="empty">No images on this page.</p>"#.to_string()
    } else {
        page.images
            .iter()
            .map(image_card)
            .collect::<Vec<_>>()
            .join("\n        ")
    };
    let nav = pagination_nav(&page.pagination);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Gallery</title>
    <style>{BASE_STYLE}
        header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            padding: 16px 24px;
            border-bottom: 1px solid #262626;
        }}
        header h1 {{ font-size: 18px; }}
        header button {{
            margin-right: 16px;
            padding: 6px 12px;
            border: 1px solid #333;
            border-radius: 6px;
            background: transparent;
            color: inherit;
            cursor: pointer;
        }}
        .grid {{
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
            gap: 16px;
            padding: 24px;
        }}
        .card {{
            background: #1a1a1a;
            border-radius: 8px;
            overflow: hidden;
            cursor: zoom-in;
        }}
        .card img, .card .missing {{
            display: block;
            width: 100%;
            height: 200px;
            object-fit: cover;
        }}
        .card .missing {{
            display: flex;
            align-items: center;
            justify-content: center;
            color: #666;
        }}
        .card figcaption {{
            padding: 8px 12px;
            font-size: 13px;
            overflow: hidden;
            text-overflow: ellipsis;
            white-space: nowrap;
        }}
        .pager {{
            display: flex;
            justify-content: center;
            gap: 24px;
            padding: 16px;
            color: #a3a3a3;
        }}
        .pager .disabled {{ color: #525252; }}
        .empty {{ color: #a3a3a3; }}
        #modal {{
            display: none;
            position: fixed;
            inset: 0;
            background: rgba(0, 0, 0, 0.9);
            align-items: center;
            justify-content: center;
            cursor: zoom-out;
        }}
        #modal img {{ max-width: 95vw; max-height: 95vh; }}
    </style>
</head>
<body>
    <header>
        <h1>Image Gallery</h1>
        <div>
            <button id="refresh">Refresh list</button>
            <a href="/logout">Sign out</a>
        </div>
    </header>
    {nav}
    <main class="grid">
        {cards}
    </main>
    {nav}
    <div id="modal"><img alt=""></div>
    <script>
        const modal = document.getElementById('modal');
        const modalImg = modal.querySelector('img');
        document.querySelectorAll('.card').forEach((card) => {{
            card.addEventListener('click', () => {{
                modalImg.src = card.dataset.full;
                modalImg.alt = card.dataset.name;
                modal.style.display = 'flex';
            }});
        }});
        modal.addEventListener('click', () => {{
            modal.style.display = 'none';
            modalImg.removeAttribute('src');
        }});
        document.getElementById('refresh').addEventListener('click', async () => {{
            const res = await fetch('/api/refresh-images', {{ headers: {{ Accept: 'application/json' }} }});
            if (res.ok) {{
                window.location.href = '/';
            }}
        }});
    </script>
</body>
</html>"##
    )
}
