use core_convolve::convolve;
use core_model::{Kernel, OutputStrip, PaddedStrip, Pixel};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn gradient_strip(height: usize, width: usize, padding: usize) -> PaddedStrip {
    let mut strip = PaddedStrip::zeroed(height, width, padding);
    let mut row = vec![Pixel::ZERO; width];
    for y in 0..height {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = Pixel::new((x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8);
        }
        strip.write_real_row(y, &row);
    }
    strip
}

fn gaussian_5x5() -> Kernel {
    core_ops::lookup("GAUSSIANBLUR5").unwrap()
}

fn bench_convolve(c: &mut Criterion) {
    let kernel = gaussian_5x5();
    let width = 512;
    let height = 512;
    let strip = gradient_strip(height, width, kernel.padding());

    let mut group = c.benchmark_group("convolve");
    for threads in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let mut output = OutputStrip::zeroed(height, width);
                convolve(&strip, &mut output, &kernel, threads);
                output
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convolve);
criterion_main!(benches);
