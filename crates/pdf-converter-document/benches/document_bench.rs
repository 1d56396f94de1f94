// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pdf-converter-document crate: the two Markdown
// heading heuristics and the Markdown → PDF renderer on synthetic input.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pdf_converter_document::markdown::{layout, relative};
use pdf_converter_document::{LayoutLine, MarkdownRenderer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Ten pages of forty lines, every tenth line set as a heading.
fn synthetic_lines() -> Vec<LayoutLine> {
    let mut lines = Vec::with_capacity(400);
    for page in 1..=10u32 {
        for n in 0..40 {
            if n % 10 == 0 {
                lines.push(LayoutLine::single(page, format!("Section {page}.{n}"), 18.0, true));
            } else {
                lines.push(LayoutLine::single(
                    page,
                    format!("Body line {n} of page {page}, long enough to look like prose."),
                    11.0,
                    false,
                ));
            }
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_heading_heuristics(c: &mut Criterion) {
    let lines = synthetic_lines();

    c.bench_function("layout::to_markdown (400 lines)", |b| {
        b.iter(|| black_box(layout::to_markdown(black_box(&lines))));
    });
    c.bench_function("relative::to_markdown (400 lines)", |b| {
        b.iter(|| black_box(relative::to_markdown(black_box(&lines))));
    });
}

fn bench_render(c: &mut Criterion) {
    let markdown = layout::to_markdown(&synthetic_lines());
    let renderer = MarkdownRenderer::default();

    c.bench_function("MarkdownRenderer::render (10 pages)", |b| {
        b.iter(|| black_box(renderer.render(black_box(&markdown))));
    });
}

criterion_group!(benches, bench_heading_heuristics, bench_render);
criterion_main!(benches);
