use crate::bitmap::{IndexedBitmap, TRANSPARENT};
use crate::palette::PaletteIndex;
use crate::region::{Point, Rect};

/// Draw coordinates are relative to the region's origin; `None` clips to the
/// whole bitmap.
#[inline]
fn clip_or_full(target: &IndexedBitmap, region: Option<&Rect>) -> Rect {
    region.copied().unwrap_or_else(|| target.full_region())
}

/// Fill the whole bitmap, or only `region` (in bitmap coordinates).
pub fn clear(target: &mut IndexedBitmap, color: PaletteIndex, region: Option<&Rect>) {
    match region {
        None => target.pixels_mut().fill(color.get()),
        Some(r) => rect_fill(target, *r, color, None),
    }
}

pub fn clear_to_transparent(target: &mut IndexedBitmap) {
    target.pixels_mut().fill(TRANSPARENT);
}

/// Swap every `old` pixel for `new`.
pub fn color_replace(target: &mut IndexedBitmap, old: PaletteIndex, new: PaletteIndex) {
    let (old, new) = (old.get(), new.get());
    for p in target.pixels_mut().iter_mut().filter(|p| **p == old) {
        *p = new;
    }
}

pub fn point(target: &mut IndexedBitmap, pos: Point, color: PaletteIndex, region: Option<&Rect>) {
    let clip = clip_or_full(target, region);
    plot(target, &clip, pos, color.get());
}

fn plot(target: &mut IndexedBitmap, clip: &Rect, pos: Point, color: u8) {
    if !clip.contains_local(pos) {
        return;
    }
    let p = Point::new(
        pos.x.saturating_add(clip.x),
        pos.y.saturating_add(clip.y),
    );
    if let Some(offset) = target.offset_of(p) {
        target.pixels_mut()[offset] = color;
    }
}

/// Straight line between two points, both inclusive.
///
/// Steps one pixel at a time along the longer axis; the minor coordinate is
/// rounded half away from zero, so both endpoints land exactly. Only the
/// steps that can fall inside the clip are walked. A zero-length line is a
/// single point.
pub fn line(
    target: &mut IndexedBitmap,
    p1: Point,
    p2: Point,
    color: PaletteIndex,
    region: Option<&Rect>,
) {
    let clip = clip_or_full(target, region);
    let Some(visible) = clip.intersect(&target.full_region()) else {
        return;
    };
    let color = color.get();

    // drawable span in region-local coordinates, inclusive
    let (ox, oy) = (clip.x as i64, clip.y as i64);
    let xs = (visible.x as i64 - ox, visible.x as i64 + visible.w as i64 - 1 - ox);
    let ys = (visible.y as i64 - oy, visible.y as i64 + visible.h as i64 - 1 - oy);

    let dx = (p2.x as i64 - p1.x as i64).abs();
    let dy = (p2.y as i64 - p1.y as i64).abs();

    if dx == 0 && dy == 0 {
        plot(target, &clip, p1, color);
        return;
    }

    if dx > dy {
        let (a, b) = if p1.x > p2.x { (p2, p1) } else { (p1, p2) };
        for (x, y) in axis_steps((a.x, a.y), (b.x, b.y), xs, ys) {
            plot(target, &clip, Point::new(x, y), color);
        }
    } else {
        let (a, b) = if p1.y > p2.y { (p2, p1) } else { (p1, p2) };
        for (y, x) in axis_steps((a.y, a.x), (b.y, b.x), ys, xs) {
            plot(target, &clip, Point::new(x, y), color);
        }
    }
}

/// `(major, minor)` pixels of a line from `a` to `b` (`a.0 <= b.0`) whose
/// major coordinate lies in `major_span` and minor in `minor_span`.
fn axis_steps(
    a: (i32, i32),
    b: (i32, i32),
    major_span: (i64, i64),
    minor_span: (i64, i64),
) -> impl Iterator<Item = (i32, i32)> {
    let (start, minor_start) = (a.0 as i64, a.1 as i64);
    let run = b.0 as i64 - start;
    let rise = b.1 as i64 - minor_start;

    let first = (major_span.0 - start).max(0);
    let last = (major_span.1 - start).min(run);

    (first..=last).filter_map(move |step| {
        let minor = minor_start + div_round(step as i128 * rise as i128, run as i128) as i64;
        // both stay between the endpoints, so they fit in i32
        (minor_span.0..=minor_span.1)
            .contains(&minor)
            .then(|| ((start + step) as i32, minor as i32))
    })
}

/// `n / d` rounded half away from zero. `d` is positive.
#[inline]
fn div_round(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

/// One-pixel border along the inside edges of `r`.
pub fn rect_outline(target: &mut IndexedBitmap, r: Rect, color: PaletteIndex, region: Option<&Rect>) {
    if r.is_empty() {
        return;
    }
    let left = r.x;
    let top = r.y;
    let right = r.x.saturating_add(r.w - 1);
    let bottom = r.y.saturating_add(r.h - 1);

    line(target, Point::new(left, top), Point::new(right, top), color, region);
    line(target, Point::new(right, top), Point::new(right, bottom), color, region);
    line(target, Point::new(left, bottom), Point::new(right, bottom), color, region);
    line(target, Point::new(left, top), Point::new(left, bottom), color, region);
}

/// Fill `r` clipped to the region and the bitmap.
pub fn rect_fill(target: &mut IndexedBitmap, r: Rect, color: PaletteIndex, region: Option<&Rect>) {
    let clip = clip_or_full(target, region);
    let Some(draw) = r
        .translate(clip.origin())
        .intersect(&clip)
        .and_then(|d| d.intersect(&target.full_region()))
    else {
        return;
    };

    let stride = target.width() as usize;
    let (x0, w) = (draw.x as usize, draw.w as usize);
    let pixels = target.pixels_mut();
    for y in draw.y as usize..(draw.y + draw.h) as usize {
        let start = y * stride + x0;
        pixels[start..start + w].fill(color.get());
    }
}

/// Copy all of `src` with its top-left at `pos`. Transparent source pixels
/// leave the destination untouched.
pub fn blit(target: &mut IndexedBitmap, pos: Point, src: &IndexedBitmap, region: Option<&Rect>) {
    blit_partial(target, pos, src, src.full_region(), region);
}

/// Copy the `src_rect` part of `src` with its top-left at `pos`.
pub fn blit_partial(
    target: &mut IndexedBitmap,
    pos: Point,
    src: &IndexedBitmap,
    src_rect: Rect,
    region: Option<&Rect>,
) {
    let clip = clip_or_full(target, region);
    let Some(source) = src_rect.intersect(&src.full_region()) else {
        return;
    };

    // where `source` lands once `src_rect`'s origin is placed at `pos`
    let dest = Rect::new(
        clip.x
            .saturating_add(pos.x)
            .saturating_add(source.x.saturating_sub(src_rect.x)),
        clip.y
            .saturating_add(pos.y)
            .saturating_add(source.y.saturating_sub(src_rect.y)),
        source.w,
        source.h,
    );
    let Some(visible) = dest
        .intersect(&clip)
        .and_then(|d| d.intersect(&target.full_region()))
    else {
        return;
    };

    let src_x = (source.x + (visible.x - dest.x)) as usize;
    let src_y = (source.y + (visible.y - dest.y)) as usize;
    let src_stride = src.width() as usize;
    let dst_stride = target.width() as usize;
    let (w, h) = (visible.w as usize, visible.h as usize);
    let (dst_x, dst_y) = (visible.x as usize, visible.y as usize);

    let src_pixels = src.pixels();
    let dst_pixels = target.pixels_mut();
    for row in 0..h {
        let s = (src_y + row) * src_stride + src_x;
        let d = (dst_y + row) * dst_stride + dst_x;
        for (dst, &p) in dst_pixels[d..d + w].iter_mut().zip(&src_pixels[s..s + w]) {
            if PaletteIndex::new(p).is_some() {
                *dst = p;
            }
        }
    }
}
