/// Lays candidates out column-major in as many columns as fit in `width`.
/// Each column is as wide as the longest candidate plus a two-space gutter.
pub fn format_grid(candidates: &[String], width: usize) -> String {
    let mut items: Vec<&str> = candidates.iter().map(|s| s.as_str()).collect();
    items.sort_unstable();
    if items.is_empty() {
        return String::new();
    }

    let longest = items.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let col_width = longest + 2;
    let cols = (width / col_width).max(1);
    let rows = items.len().div_ceil(cols);

    let mut out = String::new();
    for row in 0..rows {
        for col in 0..cols {
            let Some(item) = items.get(col * rows + row) else {
                break;
            };
            out.push_str(item);
            let has_next = items.get((col + 1) * rows + row).is_some() && col + 1 < cols;
            if has_next {
                let pad = col_width - item.chars().count();
                out.extend(std::iter::repeat_n(' ', pad));
            }
        }
        out.push('\n');
    }
    out
}

/// Longest prefix shared by every candidate, on char boundaries.
pub fn common_prefix<S: AsRef<str>>(candidates: &[S]) -> String {
    let Some((first, rest)) = candidates.split_first() else {
        return String::new();
    };
    let mut prefix = first.as_ref();
    for candidate in rest {
        let candidate = candidate.as_ref();
        let end = prefix
            .char_indices()
            .zip(candidate.chars())
            .find(|((_, a), b)| a != b)
            .map(|((i, _), _)| i)
            .unwrap_or_else(|| prefix.len().min(candidate.len()));
        prefix = &prefix[..end];
    }
    prefix.to_string()
}
