use ndarray::prelude::*;

/// Borrows an objective and counts how often it is called.
///
/// Each evaluator owns its own counter; totals are added up by whoever
/// collects the results, so two evaluators never share a count.
pub struct WrappedFunction<'a, F: 'a> {
    pub num: usize,
    pub func: &'a F,
}

impl<'a, F: Fn(ArrayView1<f64>) -> f64> WrappedFunction<'a, F> {
    pub fn new(func: &'a F) -> Self {
        WrappedFunction { num: 0, func }
    }

    pub fn call(&mut self, arg: ArrayView1<f64>) -> f64 {
        self.num += 1;
        (self.func)(arg)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn counts_calls() {
        let function = |x: ArrayView1<f64>| x.sum();
        let mut wrapped = WrappedFunction::new(&function);
        let x = Array1::from(vec![1.0, 2.0]);
        assert_eq!(wrapped.call(x.view()), 3.0);
        assert_eq!(wrapped.call(x.view()), 3.0);
        assert_eq!(wrapped.num, 2);
    }
}
