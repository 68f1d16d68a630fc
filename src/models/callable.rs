//! Callables backed by parsed expressions.

use crate::domain::{Callable, ParamGrid, ValueGrid};
use crate::math::BoundExpression;

/// Evaluates a bound expression over every point of a parameter grid.
#[derive(Debug, Clone)]
pub struct ExprCallable {
    expr: BoundExpression,
}

impl ExprCallable {
    pub fn new(expr: BoundExpression) -> Self {
        Self { expr }
    }
}

impl Callable for ExprCallable {
    fn call(&self, grid: &ParamGrid) -> Result<ValueGrid, String> {
        let shape = grid.shape();
        if shape.len() != self.expr.arity() {
            return Err(format!(
                "expected {} parameter axes, got {}",
                self.expr.arity(),
                shape.len()
            ));
        }

        let n = grid.len();
        let mut point = vec![0.0; shape.len()];
        let mut values = Vec::with_capacity(n);
        for flat in 0..n {
            grid.point(flat, &mut point);
            values.push(self.expr.eval(&point));
        }
        Ok(ValueGrid { shape, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Expression;

    #[test]
    fn evaluates_cross_product_with_ij_layout() {
        let params = vec!["x".to_string(), "y".to_string()];
        let bound = Expression::parse("10 * x + y").unwrap().bind(&params).unwrap();
        let f = ExprCallable::new(bound);
        let grid = ParamGrid::new(vec![
            ("x".to_string(), vec![1.0, 2.0]),
            ("y".to_string(), vec![0.0, 1.0, 2.0]),
        ]);
        let out = f.call(&grid).unwrap();
        assert_eq!(out.shape, vec![2, 3]);
        assert_eq!(out.values, vec![10.0, 11.0, 12.0, 20.0, 21.0, 22.0]);
    }

    #[test]
    fn rejects_wrong_axis_count() {
        let bound = Expression::parse("x").unwrap().bind(&["x".to_string()]).unwrap();
        let f = ExprCallable::new(bound);
        assert!(f.call(&ParamGrid::default()).is_err());
    }
}
