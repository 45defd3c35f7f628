extern crate ndarray;
extern crate nelmin;

use ndarray::prelude::*;
use nelmin::vector::NelderMeadBuilder;

fn main() {
    let minimizer = NelderMeadBuilder::default()
        .tol(1e-9)
        .max_evaluations(5000usize)
        .build()
        .unwrap();
    let n = 5;
    let f = |x: ArrayView1<f64>| x.iter().map(|xi| (xi - 1.0) * (xi - 1.0)).sum::<f64>();

    let x0 = Array1::zeros(n);
    let dx = Array1::from_elem(n, 0.1);
    let res = minimizer.minimize(&f, x0.view(), dx.view()).unwrap();

    println!("{:?} after {} evaluations, {} restarts", res.status, res.f_evals, res.restarts);
    println!("{}", res.simplex.best());
}
